use crate::{
    eval::{reduce_to_normal_form, Strategy, DEFAULT_MAX_STEPS},
    parser::parse,
    term::{Identifier, Term},
};

/// Combinator sources, in definition order. Later entries may mention
/// earlier names (`SUB` uses `PRED`, `LEQ` uses `IS_ZERO` and `SUB`, ...);
/// those references are resolved while the library is built, so every
/// stored combinator is a closed term.
const DEFINITIONS: &[(&str, &str)] = &[
    ("TRUE", "λx.λy.x"),
    ("FALSE", "λx.λy.y"),
    ("AND", "λp.λq.p q p"),
    ("OR", "λp.λq.p p q"),
    ("NOT", "λp.λa.λb.p b a"),
    ("IF_THEN_ELSE", "λp.λa.λb.p a b"),
    ("ZERO", "λf.λx.x"),
    ("ONE", "λf.λx.f x"),
    ("TWO", "λf.λx.f (f x)"),
    ("THREE", "λf.λx.f (f (f x))"),
    ("SUCC", "λn.λf.λx.f (n f x)"),
    ("PLUS", "λm.λn.λf.λx.m f (n f x)"),
    ("MULT", "λm.λn.λf.m (n f)"),
    ("POW", "λm.λn.n m"),
    ("PRED", "λn.λf.λx.n (λg.λh.h (g f)) (λu.x) (λu.u)"),
    ("SUB", "λm.λn.n PRED m"),
    ("IS_ZERO", "λn.n (λx.FALSE) TRUE"),
    ("LEQ", "λm.λn.IS_ZERO (SUB m n)"),
    ("EQ", "λm.λn.AND (LEQ m n) (LEQ n m)"),
    ("PAIR", "λx.λy.λf.f x y"),
    ("FIRST", "λp.p (λx.λy.x)"),
    ("SECOND", "λp.p (λx.λy.y)"),
    ("NIL", "λx.TRUE"),
    ("IS_NIL", "λl.l (λh.λt.λd.FALSE)"),
    ("CONS", "λh.λt.λc.c h t"),
    ("HEAD", "λl.l (λh.λt.h)"),
    ("TAIL", "λl.l (λh.λt.t)"),
];

/// The fixed library of Church encodings, parsed and resolved once.
pub struct Encodings {
    defs: Vec<(Identifier, Term)>,
}

impl Encodings {
    pub fn new() -> Self {
        let mut defs: Vec<(Identifier, Term)> = Vec::with_capacity(DEFINITIONS.len());
        for (name, source) in DEFINITIONS {
            let mut term = parse(source).expect("combinator sources are well formed");
            for (defined, definition) in &defs {
                term = term.substitute(defined, definition);
            }
            defs.push((Identifier::new((*name).to_string()), term));
        }
        Self { defs }
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.defs
            .iter()
            .find(|(defined, _)| defined.as_str() == name)
            .map(|(_, term)| term)
    }

    /// The combinators in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.defs.iter().map(|(name, term)| (name.as_str(), term))
    }

    fn def(&self, name: &str) -> &Term {
        self.get(name)
            .unwrap_or_else(|| unreachable!("`{name}` is in the library"))
    }

    /// The Church numeral for `n`: `n` applications of `SUCC` around
    /// `ZERO`, left unreduced like any other term.
    pub fn church_numeral(&self, n: u64) -> Term {
        let succ = self.def("SUCC");
        let mut term = self.def("ZERO").clone();
        for _ in 0..n {
            term = Term::App(succ.clone().into(), term.into());
        }
        term
    }

    /// Right-fold `items` into `CONS` cells ending in `NIL`, encoding each
    /// item on the way. Pass the identity for ready-made terms.
    pub fn church_list<I>(&self, items: I, mut encode: impl FnMut(I::Item) -> Term) -> Term
    where
        I: IntoIterator,
        I::IntoIter: DoubleEndedIterator,
    {
        let cons = self.def("CONS");
        let mut list = self.def("NIL").clone();
        for item in items.into_iter().rev() {
            list = Term::App(
                Term::App(cons.clone().into(), encode(item).into()).into(),
                list.into(),
            );
        }
        list
    }

    /// Reduce to normal form and read the result back as a boolean, if it
    /// is alpha-equivalent to `TRUE` or `FALSE`.
    pub fn to_boolean(&self, term: &Term) -> Option<bool> {
        let reduced = reduce_to_normal_form(term, Strategy::Normal, DEFAULT_MAX_STEPS).term;
        if reduced.is_alpha_equivalent(self.def("TRUE")) {
            Some(true)
        } else if reduced.is_alpha_equivalent(self.def("FALSE")) {
            Some(false)
        } else {
            None
        }
    }
}

impl Default for Encodings {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a term back as a Church numeral: `λf.λx.f (f ... (f x))` with the
/// application chain exactly `k` deep yields `Some(k)`. The term is not
/// reduced first.
pub fn extract_church_numeral(term: &Term) -> Option<u64> {
    let (f_param, body) = match term {
        Term::Abs(param, body) => (param, body),
        _ => return None,
    };
    let (x_param, mut chain) = match body.as_ref() {
        Term::Abs(param, body) => (param, body.as_ref()),
        _ => return None,
    };
    let mut count = 0;
    while let Term::App(lhs, rhs) = chain {
        match lhs.as_ref() {
            Term::Var(name) if name == f_param => {}
            _ => return None,
        }
        chain = rhs.as_ref();
        count += 1;
    }
    match chain {
        Term::Var(name) if name == x_param => Some(count),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    fn library() -> Encodings {
        Encodings::new()
    }

    fn apply(encodings: &Encodings, combinator: &str, args: &[&Term]) -> Term {
        let mut term = encodings.def(combinator).clone();
        for arg in args {
            term = Term::App(term.into(), (*arg).clone().into());
        }
        term
    }

    fn normalize(term: &Term) -> Term {
        let reduction = reduce_to_normal_form(term, Strategy::Normal, DEFAULT_MAX_STEPS);
        assert!(reduction.normal_form, "{term} did not normalize");
        reduction.term
    }

    fn numeral(encodings: &Encodings, combinator: &str, args: &[&Term]) -> Option<u64> {
        extract_church_numeral(&normalize(&apply(encodings, combinator, args)))
    }

    #[test]
    fn test_library_is_closed_and_round_trips() {
        let encodings = library();
        let mut count = 0;
        for (name, term) in encodings.iter() {
            assert!(
                term.free_variables().is_empty(),
                "{name} still has free variables"
            );
            let reparsed = parse(&term.to_string()).unwrap();
            assert!(reparsed.is_alpha_equivalent(term), "{name} round trip");
            count += 1;
        }
        assert_eq!(count, 27);
    }

    #[test]
    fn test_numerals_extract_without_reduction() {
        let encodings = library();
        assert_eq!(extract_church_numeral(encodings.def("ZERO")), Some(0));
        assert_eq!(extract_church_numeral(encodings.def("ONE")), Some(1));
        assert_eq!(extract_church_numeral(encodings.def("TWO")), Some(2));
        assert_eq!(extract_church_numeral(encodings.def("THREE")), Some(3));
        assert_eq!(extract_church_numeral(encodings.def("TRUE")), None);
        assert_eq!(extract_church_numeral(&parse("x").unwrap()), None);
        assert_eq!(extract_church_numeral(&parse("λf.λx.f (g x)").unwrap()), None);
        assert_eq!(extract_church_numeral(&parse("λf.λx.f f").unwrap()), None);
    }

    #[test]
    fn test_church_numeral_builder() {
        let encodings = library();
        assert_eq!(extract_church_numeral(&encodings.church_numeral(0)), Some(0));
        let five = normalize(&encodings.church_numeral(5));
        assert_eq!(extract_church_numeral(&five), Some(5));
    }

    #[test]
    fn test_arithmetic() {
        let encodings = library();
        let two = encodings.church_numeral(2);
        let three = encodings.church_numeral(3);
        assert_eq!(numeral(&encodings, "PLUS", &[&two, &three]), Some(5));
        assert_eq!(numeral(&encodings, "MULT", &[&two, &three]), Some(6));
        assert_eq!(numeral(&encodings, "POW", &[&two, &three]), Some(8));
        assert_eq!(numeral(&encodings, "SUCC", &[&three]), Some(4));
        assert_eq!(numeral(&encodings, "PRED", &[&three]), Some(2));
        assert_eq!(numeral(&encodings, "PRED", &[&encodings.church_numeral(0)]), Some(0));
        assert_eq!(numeral(&encodings, "SUB", &[&three, &two]), Some(1));
        assert_eq!(numeral(&encodings, "SUB", &[&two, &three]), Some(0));
    }

    #[test]
    fn test_boolean_connectives() {
        let encodings = library();
        let t = encodings.def("TRUE").clone();
        let f = encodings.def("FALSE").clone();
        assert_eq!(encodings.to_boolean(&apply(&encodings, "AND", &[&t, &f])), Some(false));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "AND", &[&t, &t])), Some(true));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "OR", &[&f, &t])), Some(true));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "OR", &[&f, &f])), Some(false));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "NOT", &[&t])), Some(false));
        assert_eq!(encodings.to_boolean(&parse("λx.x").unwrap()), None);
    }

    #[test]
    fn test_resolved_comparisons_compute() {
        // LEQ and EQ only work because PRED, SUB, IS_ZERO and AND were
        // spliced into their definitions at build time.
        let encodings = library();
        let two = encodings.church_numeral(2);
        let three = encodings.church_numeral(3);
        let zero = encodings.church_numeral(0);
        assert_eq!(encodings.to_boolean(&apply(&encodings, "IS_ZERO", &[&zero])), Some(true));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "IS_ZERO", &[&two])), Some(false));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "LEQ", &[&two, &three])), Some(true));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "LEQ", &[&three, &two])), Some(false));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "EQ", &[&two, &two])), Some(true));
        assert_eq!(encodings.to_boolean(&apply(&encodings, "EQ", &[&two, &three])), Some(false));
    }

    #[test]
    fn test_conditional_selects_branch() {
        let encodings = library();
        let t = encodings.def("TRUE").clone();
        let f = encodings.def("FALSE").clone();
        let a = parse("a").unwrap();
        let b = parse("b").unwrap();
        assert_eq!(
            normalize(&apply(&encodings, "IF_THEN_ELSE", &[&t, &a, &b])),
            a
        );
        assert_eq!(
            normalize(&apply(&encodings, "IF_THEN_ELSE", &[&f, &a, &b])),
            b
        );
    }

    #[test]
    fn test_pairs() {
        let encodings = library();
        let a = parse("a").unwrap();
        let b = parse("b").unwrap();
        let pair = apply(&encodings, "PAIR", &[&a, &b]);
        assert_eq!(normalize(&apply(&encodings, "FIRST", &[&pair])), a);
        assert_eq!(normalize(&apply(&encodings, "SECOND", &[&pair])), b);
    }

    #[test]
    fn test_lists() {
        let encodings = library();
        let list = encodings.church_list([1u64, 2], |n| encodings.church_numeral(n));
        let head = normalize(&apply(&encodings, "HEAD", &[&list]));
        assert_eq!(extract_church_numeral(&head), Some(1));

        let tail = normalize(&apply(&encodings, "TAIL", &[&list]));
        let head_of_tail = normalize(&apply(&encodings, "HEAD", &[&tail]));
        assert_eq!(extract_church_numeral(&head_of_tail), Some(2));

        let single = encodings.church_list([parse("a").unwrap()], |term| term);
        let rest = normalize(&apply(&encodings, "TAIL", &[&single]));
        assert!(rest.is_alpha_equivalent(encodings.def("NIL")));

        assert_eq!(
            encodings.to_boolean(&apply(&encodings, "IS_NIL", &[encodings.def("NIL")])),
            Some(true)
        );
    }
}
