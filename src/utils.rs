use std::{
    fmt::{self, Debug, Display},
    hash::BuildHasherDefault,
};
use xxhash_rust::xxh3::Xxh3;

pub type HashSet<K> = std::collections::HashSet<K, BuildHasherDefault<Xxh3>>;
pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<Xxh3>>;

/// Unwraps a lookup that must succeed because the id was registered earlier in the
/// same round. A miss means the registers and the graph have diverged, which is a bug
/// and not something callers can recover from
pub(crate) trait ExpectRegistered<T> {
    fn expect_registered(self, what: &dyn Debug) -> T;
}

impl<T> ExpectRegistered<T> for Option<T> {
    #[inline]
    #[track_caller]
    fn expect_registered(self, what: &dyn Debug) -> T {
        match self {
            Some(value) => value,
            None => panic_unregistered(what),
        }
    }
}

#[cold]
#[track_caller]
#[inline(never)]
fn panic_unregistered(what: &dyn Debug) -> ! {
    panic!(
        "{:?} was registered this round but no longer resolves, \
         registers and interference graph have diverged",
        what,
    )
}

/// Formats a weight the way the problem format spells it, `inf` for unbounded weights
pub struct DisplayWeight(pub f64);

impl Display for DisplayWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infinite() && self.0.is_sign_positive() {
            f.write_str("inf")
        } else {
            Display::fmt(&self.0, f)
        }
    }
}

/// Writes `items` as `{a, b, c}`
pub(crate) fn write_set<I, T>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    f.write_str("{")?;
    for (idx, item) in items.into_iter().enumerate() {
        if idx != 0 {
            f.write_str(", ")?;
        }
        Display::fmt(&item, f)?;
    }
    f.write_str("}")
}
