use std::ops::Deref;

/// A value that's either borrowed from a longer-lived table or synthesized on
/// demand.  Like Cow, without requiring `ToOwned`.
#[derive(Debug)]
pub enum OwnedOrBorrowed<'a, T> {
    Owned(T),
    Borrowed(&'a T),
}

impl<'a, T> OwnedOrBorrowed<'a, T> {
    /// True when the value was made up rather than found.
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

impl<'a, T> Deref for OwnedOrBorrowed<'a, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(t) => t,
            Self::Borrowed(t) => t,
        }
    }
}

#[test]
fn test_owned_or_borrowed() {
    let table = vec![1, 2, 3];
    let borrowed: OwnedOrBorrowed<Vec<i32>> = OwnedOrBorrowed::Borrowed(&table);
    assert!(!borrowed.is_owned());
    assert_eq!(borrowed.len(), 3);
    let owned = OwnedOrBorrowed::Owned(vec![4]);
    assert!(owned.is_owned());
    assert_eq!(*owned, vec![4]);
}
