use crate::components::molecule::AtomVisual;

/// Atoms freed from reactants, waiting to be pulled into products.
///
/// Matching is best effort: an atom with the requested symbol is taken if
/// one is left, otherwise the most recently freed atom of any element.
/// Nothing here conserves atom counts between the two sides.
#[derive(Debug, Clone, Default)]
pub struct AtomPool {
    free: Vec<AtomVisual>,
}

impl AtomPool {
    pub fn new(free: Vec<AtomVisual>) -> Self {
        Self { free }
    }

    /// First atom with `symbol`, else the last remaining atom.
    pub fn take(&mut self, symbol: &str) -> Option<AtomVisual> {
        match self.free.iter().position(|a| a.symbol == symbol) {
            Some(i) => Some(self.free.remove(i)),
            None => self.free.pop(),
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Atoms nobody asked for.
    pub fn into_leftovers(self) -> Vec<AtomVisual> {
        self.free
    }
}
