use crate::audio::features::Spectrum;

/// Fixed-capacity, oldest-first window of recent spectra.
///
/// Backed by a ring of slots with a cursor; once full, each push overwrites the
/// oldest slot in place.
#[derive(Clone, Debug)]
pub struct SpectrumHistory {
    slots: Vec<Spectrum>,
    /// Slot holding the oldest entry once the ring is full.
    head: usize,
    capacity: usize,
}

impl SpectrumHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, spectrum: Spectrum) {
        if self.capacity == 0 {
            return;
        }
        if self.slots.len() < self.capacity {
            self.slots.push(spectrum);
        } else {
            self.slots[self.head] = spectrum;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn latest(&self) -> Option<&Spectrum> {
        self.snapshot().iter().next_back()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let (newer, older) = self.slots.split_at(self.head);
        Snapshot { older, newer }
    }
}

/// Borrowed oldest-to-newest view of a [`SpectrumHistory`].
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    older: &'a [Spectrum],
    newer: &'a [Spectrum],
}

impl<'a> Snapshot<'a> {
    pub fn len(&self) -> usize {
        self.older.len() + self.newer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry `index` counting from the oldest.
    pub fn get(&self, index: usize) -> Option<&'a Spectrum> {
        let (older, newer) = (self.older, self.newer);
        if index < older.len() {
            older.get(index)
        } else {
            newer.get(index - older.len())
        }
    }

    pub fn iter(self) -> impl DoubleEndedIterator<Item = &'a Spectrum> + 'a {
        self.older.iter().chain(self.newer.iter())
    }

    pub fn to_vec(&self) -> Vec<Spectrum> {
        self.iter().cloned().collect()
    }
}
