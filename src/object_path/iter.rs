/// An iterator over the elements of an [`ObjectPath`].
///
/// [`ObjectPath`]: crate::ObjectPath
pub struct Iter<'a> {
    data: &'a str,
}

impl<'a> Iter<'a> {
    pub(super) fn new(data: &'a str) -> Self {
        // NB: trim leading '/'.
        Self {
            data: data.get(1..).unwrap_or_default(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let element = match self.data.split_once('/') {
            Some((head, tail)) => {
                self.data = tail;
                head
            }
            None => std::mem::take(&mut self.data),
        };

        Some(element)
    }
}
