
pub trait IteratorExt<T> {
    /// Returns the only element of the iterator, or `None` if it yields zero or several.
    fn single(self) -> Option<T> where Self: Sized;
}

impl<T, I: Iterator<Item=T>> IteratorExt<T> for I {
    fn single(mut self) -> Option<T> where Self: Sized {
        match (self.next(), self.next()) {
            (Some(e), None) => Some(e),
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IteratorExt;

    #[test]
    fn single_element() {
        assert_eq!([7].into_iter().single(), Some(7));
        assert_eq!(Vec::<u8>::new().into_iter().single(), None);
        assert_eq!([1, 2].into_iter().single(), None);
    }
}
