/// Exclusive accordion: opening one item collapses every other one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaqAccordion {
    expanded: Vec<bool>,
}

impl FaqAccordion {
    pub fn new(len: usize) -> Self {
        Self {
            expanded: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Flips `index` and collapses the rest. Returns whether `index` is now open.
    pub fn toggle(&mut self, index: usize) -> bool {
        let Some(current) = self.expanded.get(index).copied() else {
            return false;
        };
        for (i, open) in self.expanded.iter_mut().enumerate() {
            *open = i == index && !current;
        }
        !current
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    /// Value for the item button's `aria-expanded` attribute.
    pub fn aria_expanded(&self, index: usize) -> &'static str {
        if self.is_expanded(index) {
            "true"
        } else {
            "false"
        }
    }

    pub fn expanded_index(&self) -> Option<usize> {
        self.expanded.iter().position(|open| *open)
    }
}
