use super::validation::complete_type_len;

/// Iterator over the single complete types of a [`Signature`].
///
/// [`Signature`]: crate::Signature
pub struct Iter<'a> {
    rest: &'a str,
}

impl<'a> Iter<'a> {
    #[inline]
    pub(crate) fn new(rest: &'a str) -> Self {
        Self { rest }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let n = complete_type_len(self.rest.as_bytes())?;
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Some(head)
    }
}
