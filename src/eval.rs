use crate::term::Term;

pub const DEFAULT_MAX_STEPS: usize = 1000;

#[derive(PartialEq, Eq, Clone, Copy, derive_more::Display, Debug)]
pub enum Strategy {
    /// Contract the leftmost-outermost redex first.
    #[display(fmt = "normal")]
    Normal,
    /// Contract the innermost redex first, arguments before functions.
    #[display(fmt = "applicative")]
    Applicative,
}

/// The outcome of a whole-term reduction: the final (or best-effort) term,
/// how many steps were contracted, whether a normal form was confirmed, and
/// the rendered term after every step.
#[derive(Clone, Debug)]
pub struct Reduction {
    pub term: Term,
    pub steps: usize,
    pub normal_form: bool,
    pub trace: Vec<String>,
}

pub fn is_beta_redex(term: &Term) -> bool {
    matches!(term, Term::App(lhs, _) if matches!(lhs.as_ref(), Term::Abs(..)))
}

pub fn is_normal_form(term: &Term) -> bool {
    match term {
        Term::Var(_) => true,
        Term::Abs(_, body) => is_normal_form(body),
        Term::App(lhs, rhs) => {
            !matches!(lhs.as_ref(), Term::Abs(..)) && is_normal_form(lhs) && is_normal_form(rhs)
        }
    }
}

/// Perform at most one beta step. A redex contracts in place; otherwise the
/// search recurses into an abstraction's body, then an application's
/// function side, then its argument side, so the leftmost-outermost redex
/// is always the one contracted.
pub fn beta_reduce_once(term: &Term) -> (Term, bool) {
    match term {
        Term::Var(_) => (term.clone(), false),
        Term::Abs(param, body) => {
            let (body, reduced) = beta_reduce_once(body);
            if reduced {
                (Term::Abs(param.clone(), body.into()), true)
            } else {
                (term.clone(), false)
            }
        }
        Term::App(lhs, rhs) => {
            if let Term::Abs(param, body) = lhs.as_ref() {
                return (body.substitute(param.as_str(), rhs), true);
            }
            let (reduced, was_reduced) = beta_reduce_once(lhs);
            if was_reduced {
                return (Term::App(reduced.into(), rhs.clone()), true);
            }
            let (reduced, was_reduced) = beta_reduce_once(rhs);
            if was_reduced {
                return (Term::App(lhs.clone(), reduced.into()), true);
            }
            (term.clone(), false)
        }
    }
}

pub fn reduce_to_normal_form(term: &Term, strategy: Strategy, max_steps: usize) -> Reduction {
    match strategy {
        Strategy::Normal => reduce_normal_order(term, max_steps),
        Strategy::Applicative => reduce_applicative_order(term, max_steps),
    }
}

fn reduce_normal_order(term: &Term, max_steps: usize) -> Reduction {
    let mut term = term.clone();
    let mut trace = Vec::new();
    let mut steps = 0;
    while steps < max_steps {
        let (next, reduced) = beta_reduce_once(&term);
        if !reduced {
            return Reduction {
                term,
                steps,
                normal_form: true,
                trace,
            };
        }
        trace.push(next.to_string());
        term = next;
        steps += 1;
    }
    Reduction {
        term,
        steps,
        normal_form: false,
        trace,
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Direction {
    Body,
    Left,
    Right,
}

/// Depth-first search for the innermost redex, preferring an application's
/// argument over its function and treating a node as the redex only after
/// its children turned up none. On success `path` addresses the redex.
fn find_innermost_redex(term: &Term, path: &mut Vec<Direction>) -> bool {
    match term {
        Term::Var(_) => false,
        Term::Abs(_, body) => {
            path.push(Direction::Body);
            if find_innermost_redex(body, path) {
                return true;
            }
            path.pop();
            false
        }
        Term::App(lhs, rhs) => {
            path.push(Direction::Right);
            if find_innermost_redex(rhs, path) {
                return true;
            }
            path.pop();
            path.push(Direction::Left);
            if find_innermost_redex(lhs, path) {
                return true;
            }
            path.pop();
            is_beta_redex(term)
        }
    }
}

fn subterm_at<'a>(term: &'a Term, path: &[Direction]) -> &'a Term {
    let (direction, rest) = match path.split_first() {
        Some(step) => step,
        None => return term,
    };
    match (term, direction) {
        (Term::Abs(_, body), Direction::Body) => subterm_at(body, rest),
        (Term::App(lhs, _), Direction::Left) => subterm_at(lhs, rest),
        (Term::App(_, rhs), Direction::Right) => subterm_at(rhs, rest),
        _ => unreachable!("redex path does not address the term"),
    }
}

/// Rebuild the term with `replacement` at `path`, sharing every untouched
/// subtree.
fn replace_at(term: &Term, path: &[Direction], replacement: Term) -> Term {
    let (direction, rest) = match path.split_first() {
        Some(step) => step,
        None => return replacement,
    };
    match (term, direction) {
        (Term::Abs(param, body), Direction::Body) => {
            Term::Abs(param.clone(), replace_at(body, rest, replacement).into())
        }
        (Term::App(lhs, rhs), Direction::Left) => {
            Term::App(replace_at(lhs, rest, replacement).into(), rhs.clone())
        }
        (Term::App(lhs, rhs), Direction::Right) => {
            Term::App(lhs.clone(), replace_at(rhs, rest, replacement).into())
        }
        _ => unreachable!("redex path does not address the term"),
    }
}

fn reduce_applicative_order(term: &Term, max_steps: usize) -> Reduction {
    let mut term = term.clone();
    let mut trace = Vec::new();
    let mut steps = 0;
    let mut path = Vec::new();
    while steps < max_steps {
        path.clear();
        if !find_innermost_redex(&term, &mut path) {
            return Reduction {
                term,
                steps,
                normal_form: true,
                trace,
            };
        }
        let contracted = match subterm_at(&term, &path) {
            Term::App(lhs, rhs) => match lhs.as_ref() {
                Term::Abs(param, body) => body.substitute(param.as_str(), rhs),
                _ => unreachable!("the found redex has an abstraction on the left"),
            },
            _ => unreachable!("the found redex is an application"),
        };
        term = replace_at(&term, &path, contracted);
        trace.push(term.to_string());
        steps += 1;
    }
    Reduction {
        term,
        steps,
        normal_form: false,
        trace,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_redex_predicates() {
        assert!(is_beta_redex(&parse("(λx.x) y").unwrap()));
        assert!(!is_beta_redex(&parse("x y").unwrap()));
        assert!(!is_beta_redex(&parse("λx.(λy.y) x").unwrap()));

        assert!(is_normal_form(&parse("x").unwrap()));
        assert!(is_normal_form(&parse("x (λy.y z)").unwrap()));
        assert!(!is_normal_form(&parse("λx.(λy.y) x").unwrap()));
        assert!(!is_normal_form(&parse("x ((λy.y) z)").unwrap()));
    }

    #[test]
    fn test_single_step_to_normal_form() {
        let term = parse("(λx.x) y").unwrap();
        let reduction = reduce_to_normal_form(&term, Strategy::Normal, DEFAULT_MAX_STEPS);
        assert_eq!(reduction.term, parse("y").unwrap());
        assert_eq!(reduction.steps, 1);
        assert!(reduction.normal_form);
        assert_eq!(reduction.trace, vec!["y".to_string()]);
    }

    #[test]
    fn test_step_prefers_body_then_function_then_argument() {
        let (term, reduced) = beta_reduce_once(&parse("λz.(λx.x) z").unwrap());
        assert!(reduced);
        assert_eq!(term.to_string(), "λz.z");

        let (term, reduced) = beta_reduce_once(&parse("((λx.x) a) ((λy.y) b)").unwrap());
        assert!(reduced);
        assert_eq!(term.to_string(), "a ((λy.y) b)");

        let (term, reduced) = beta_reduce_once(&parse("a ((λy.y) b)").unwrap());
        assert!(reduced);
        assert_eq!(term.to_string(), "a b");
    }

    #[test]
    fn test_normal_form_is_a_fixed_point() {
        let term = parse("x (λy.y z)").unwrap();
        assert!(is_normal_form(&term));
        let (same, reduced) = beta_reduce_once(&term);
        assert!(!reduced);
        assert_eq!(same, term);
    }

    #[test]
    fn test_strategies_pick_different_redexes() {
        let term = parse("(λx.x) ((λy.y) z)").unwrap();

        let normal = reduce_to_normal_form(&term, Strategy::Normal, DEFAULT_MAX_STEPS);
        assert_eq!(normal.trace, vec!["(λy.y) z".to_string(), "z".to_string()]);

        let applicative = reduce_to_normal_form(&term, Strategy::Applicative, DEFAULT_MAX_STEPS);
        assert_eq!(
            applicative.trace,
            vec!["(λx.x) z".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn test_discarded_diverging_argument() {
        // Normal order throws the argument away; applicative order keeps
        // contracting Ω in place until the step limit runs out.
        let term = parse("(λx.λy.x) z ((λw.w w) (λw.w w))").unwrap();

        let normal = reduce_to_normal_form(&term, Strategy::Normal, 50);
        assert_eq!(normal.term, parse("z").unwrap());
        assert_eq!(normal.steps, 2);
        assert!(normal.normal_form);

        let applicative = reduce_to_normal_form(&term, Strategy::Applicative, 50);
        assert_eq!(applicative.steps, 50);
        assert!(!applicative.normal_form);
    }

    #[test]
    fn test_step_limit_returns_best_effort_term() {
        let omega = parse("(λw.w w) (λw.w w)").unwrap();
        let reduction = reduce_to_normal_form(&omega, Strategy::Normal, 7);
        assert_eq!(reduction.steps, 7);
        assert!(!reduction.normal_form);
        assert!(reduction.term.is_alpha_equivalent(&omega));
        assert_eq!(reduction.trace.len(), 7);
    }

    #[test]
    fn test_substitution_inside_reduction_avoids_capture() {
        // (λx.λy.x) y must not bind the free y of the argument.
        let term = parse("(λx.λy.x) y").unwrap();
        let reduction = reduce_to_normal_form(&term, Strategy::Normal, DEFAULT_MAX_STEPS);
        assert!(!reduction.term.is_alpha_equivalent(&parse("λy.y").unwrap()));
        assert_eq!(reduction.term.to_string(), "λy1.y");
    }
}
