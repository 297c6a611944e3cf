use std::borrow::Borrow;

/// Ordered labels for one array axis. Positions follow insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelIndex<T> {
    labels: Vec<T>,
}

impl<T: PartialEq> LabelIndex<T> {
    pub fn new(labels: Vec<T>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[T] {
        &self.labels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.labels.iter()
    }

    pub fn position<Q>(&self, label: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.labels
            .iter()
            .position(|candidate| <T as Borrow<Q>>::borrow(candidate) == label)
    }

    pub fn contains<Q>(&self, label: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(label).is_some()
    }

    pub fn first_duplicate(&self) -> Option<&T> {
        self.labels
            .iter()
            .enumerate()
            .find(|(index, label)| self.labels[..*index].contains(*label))
            .map(|(_, label)| label)
    }
}

impl<T: PartialEq + Clone> LabelIndex<T> {
    pub fn concat(&self, other: &Self) -> Self {
        let mut labels = self.labels.clone();
        labels.extend(other.labels.iter().cloned());
        Self { labels }
    }

    /// Labels of `self` followed by those of `other` not already present.
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for label in &other.labels {
            if !merged.contains(label) {
                merged.labels.push(label.clone());
            }
        }
        merged
    }
}

impl<'a, T> IntoIterator for &'a LabelIndex<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}
