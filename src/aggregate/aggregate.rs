use crate::error::Result;

/// A state value made of named top-level fields.
///
/// Implementors name the partial type used to overwrite a subset of their
/// fields and define the shallow merge: fields present in the partial replace
/// the current ones wholesale, every other field keeps its value. The merge
/// builds a new aggregate; `self` is never modified.
///
/// Struct aggregates are usually declared with [`aggregate!`](crate::aggregate).
pub trait Aggregate: Send + Sync + Sized + 'static {
    /// The partial value accepted by [`merge`](Aggregate::merge).
    type Partial: 'static;

    /// Produce a new aggregate with the fields of `partial` overwritten.
    fn merge(&self, partial: Self::Partial) -> Result<Self>;
}

type Updater<'a, S> = Box<dyn FnOnce(&S) -> <S as Aggregate>::Partial + 'a>;

/// A pending write: either a literal partial or a function of the previous state.
///
/// The lifetime lets an updater borrow from the caller; it only has to live
/// until the write returns.
pub enum Update<'a, S: Aggregate> {
    /// Overwrite the fields present in this partial.
    Partial(S::Partial),
    /// Compute the partial from the state as it was before the write.
    With(Updater<'a, S>),
}

impl<'a, S: Aggregate> Update<'a, S> {
    /// Build an updater from a function of the previous state.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&S) -> S::Partial + 'a,
    {
        Update::With(Box::new(f))
    }

    /// Resolve this update against the pre-write state.
    pub(crate) fn resolve(self, prev: &S) -> S::Partial {
        match self {
            Update::Partial(partial) => partial,
            Update::With(f) => f(prev),
        }
    }
}

impl<S: Aggregate> std::fmt::Debug for Update<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Partial(_) => f.write_str("Update::Partial(..)"),
            Update::With(_) => f.write_str("Update::With(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        left: i32,
        right: i32,
    }

    impl Aggregate for Pair {
        type Partial = (Option<i32>, Option<i32>);

        fn merge(&self, (left, right): Self::Partial) -> Result<Self> {
            Ok(Pair {
                left: left.unwrap_or(self.left),
                right: right.unwrap_or(self.right),
            })
        }
    }

    #[test]
    fn resolve_literal_partial() {
        let prev = Pair { left: 1, right: 2 };
        let partial = Update::<Pair>::Partial((Some(5), None)).resolve(&prev);
        assert_eq!(prev.merge(partial).unwrap(), Pair { left: 5, right: 2 });
    }

    #[test]
    fn resolve_updater_sees_previous_state() {
        let prev = Pair { left: 1, right: 2 };
        let update = Update::<Pair>::with(|p: &Pair| (None, Some(p.left + p.right)));
        let partial = update.resolve(&prev);
        assert_eq!(prev.merge(partial).unwrap(), Pair { left: 1, right: 3 });
    }

    #[test]
    fn updater_can_borrow_locals() {
        let prev = Pair { left: 1, right: 2 };
        let step = 10;
        let seen = std::cell::Cell::new(0);

        let update = Update::<Pair>::with(|p: &Pair| {
            seen.set(p.left);
            (Some(p.left + step), None)
        });
        let partial = update.resolve(&prev);

        assert_eq!(seen.get(), 1);
        assert_eq!(prev.merge(partial).unwrap(), Pair { left: 11, right: 2 });
    }
}
