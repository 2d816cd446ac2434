use std::{collections::HashSet, fmt, rc::Rc};

pub type Identifier = Rc<String>;
pub type TermRef = Rc<Term>;

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    /// `x`
    Var(Identifier),
    /// `λx.t`
    Abs(Identifier, TermRef),
    /// `t t`
    App(TermRef, TermRef),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => f.write_str(name),
            Term::Abs(param, body) => write!(f, "λ{param}.{body}"),
            Term::App(lhs, rhs) => {
                match lhs.as_ref() {
                    Term::Abs(..) => write!(f, "({lhs})")?,
                    _ => write!(f, "{lhs}")?,
                }
                f.write_str(" ")?;
                match rhs.as_ref() {
                    Term::Var(_) => write!(f, "{rhs}"),
                    _ => write!(f, "({rhs})"),
                }
            }
        }
    }
}

impl Term {
    pub fn free_variables(&self) -> HashSet<Identifier> {
        match self {
            Term::Var(name) => HashSet::from([name.clone()]),
            Term::Abs(param, body) => {
                let mut vars = body.free_variables();
                vars.remove(param);
                vars
            }
            Term::App(lhs, rhs) => {
                let mut vars = lhs.free_variables();
                vars.extend(rhs.free_variables());
                vars
            }
        }
    }

    pub fn bound_variables(&self) -> HashSet<Identifier> {
        match self {
            Term::Var(_) => HashSet::new(),
            Term::Abs(param, body) => {
                let mut vars = body.bound_variables();
                vars.insert(param.clone());
                vars
            }
            Term::App(lhs, rhs) => {
                let mut vars = lhs.bound_variables();
                vars.extend(rhs.bound_variables());
                vars
            }
        }
    }

    /// Capture-avoiding substitution of `replacement` for free occurrences
    /// of `name`.
    pub fn substitute(&self, name: &str, replacement: &Term) -> Term {
        match self {
            Term::Var(n) => {
                if n.as_str() == name {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Term::App(lhs, rhs) => Term::App(
                lhs.substitute(name, replacement).into(),
                rhs.substitute(name, replacement).into(),
            ),
            Term::Abs(param, body) => {
                // The parameter shadows `name`: nothing to substitute below.
                if param.as_str() == name {
                    return self.clone();
                }
                let replacement_free = replacement.free_variables();
                if replacement_free.contains(param) {
                    // Substituting under this binder would capture the
                    // replacement's free `param`: rename the binder to a name
                    // unused on either side first.
                    let mut used = replacement_free;
                    used.extend(body.free_variables());
                    let fresh = fresh_name(param, &used);
                    let renamed = body.substitute(param, &Term::Var(fresh.clone()));
                    Term::Abs(fresh, renamed.substitute(name, replacement).into())
                } else {
                    Term::Abs(param.clone(), body.substitute(name, replacement).into())
                }
            }
        }
    }

    /// Structural equality up to consistent renaming of bound variables.
    pub fn is_alpha_equivalent(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Var(lhs), Term::Var(rhs)) => lhs == rhs,
            (Term::App(ll, lr), Term::App(rl, rr)) => {
                ll.is_alpha_equivalent(rl) && lr.is_alpha_equivalent(rr)
            }
            (Term::Abs(p1, b1), Term::Abs(p2, b2)) => {
                if p1 == p2 {
                    return b1.is_alpha_equivalent(b2);
                }
                let mut used = b1.free_variables();
                used.extend(b2.free_variables());
                let fresh = Term::Var(fresh_name(p1, &used));
                b1.substitute(p1, &fresh)
                    .is_alpha_equivalent(&b2.substitute(p2, &fresh))
            }
            _ => false,
        }
    }
}

/// Linear probe `base`, `base1`, `base2`, ... until a name not in `used`
/// turns up. Deterministic, so renamings reproduce across runs.
fn fresh_name(base: &str, used: &HashSet<Identifier>) -> Identifier {
    let mut candidate = base.to_string();
    let mut i = 0;
    while used.contains(&candidate) {
        i += 1;
        candidate = format!("{base}{i}");
    }
    Identifier::new(candidate)
}
