//! Runtime string values
//!
//! Bytecode never sees string contents, only handles. Handle 0 is the
//! empty string and is never allocated; freed slots are reused.
use crate::interpreter::core::instruction::Aword;
use log::trace;

/// Slots a restored heap may span. The heap only grows to its peak number
/// of live strings, so a saved handle above this is damaged data.
pub const MAX_STRING_SLOTS: usize = 0x1_0000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringHeap {
    slots: Vec<Option<String>>,
    free: Vec<usize>,
}

impl StringHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a string and return its handle
    pub fn alloc(&mut self, text: impl Into<String>) -> Aword {
        let text = text.into();
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(text);
                index
            }
            None => {
                self.slots.push(Some(text));
                self.slots.len() - 1
            }
        };
        trace!("string heap: alloc handle {}", index + 1);
        (index + 1) as Aword
    }

    fn slot(&self, handle: Aword) -> Result<&String, String> {
        self.slots
            .get((handle as usize).wrapping_sub(1))
            .and_then(|s| s.as_ref())
            .ok_or_else(|| format!("Invalid string handle {handle}"))
    }

    pub fn get(&self, handle: Aword) -> Result<&str, String> {
        if handle == 0 {
            return Ok("");
        }
        self.slot(handle).map(|s| s.as_str())
    }

    /// Read and release a string
    pub fn take(&mut self, handle: Aword) -> Result<String, String> {
        if handle == 0 {
            return Ok(String::new());
        }
        let text = self.slot(handle)?.clone();
        self.free(handle);
        Ok(text)
    }

    /// Allocate an independent copy of a string
    pub fn copy(&mut self, handle: Aword) -> Result<Aword, String> {
        let text = self.get(handle)?.to_string();
        Ok(self.alloc(text))
    }

    /// Release a handle; releasing 0 or an already free handle does nothing
    pub fn free(&mut self, handle: Aword) {
        let index = (handle as usize).wrapping_sub(1);
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.take().is_some() {
                self.free.push(index);
            }
        }
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Live strings in handle order
    pub fn entries(&self) -> impl Iterator<Item = (Aword, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_deref().map(|s| ((i + 1) as Aword, s)))
    }

    /// Rebuild the heap from saved entries, keeping the saved handles
    pub fn from_entries(entries: Vec<(Aword, String)>) -> Result<Self, String> {
        let mut heap = StringHeap::new();
        for (handle, text) in entries {
            if handle == 0 {
                return Err("String handle 0 cannot be stored".to_string());
            }
            let index = handle as usize - 1;
            if index >= MAX_STRING_SLOTS {
                return Err(format!("String handle {handle} out of range"));
            }
            if index >= heap.slots.len() {
                heap.slots.resize(index + 1, None);
            }
            if heap.slots[index].is_some() {
                return Err(format!("Duplicate string handle {handle}"));
            }
            heap.slots[index] = Some(text);
        }
        heap.free = heap
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .rev()
            .collect();
        Ok(heap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn handles_start_at_one_and_are_reused() {
        let mut heap = StringHeap::new();
        let a = heap.alloc("apple");
        let b = heap.alloc("banana");
        assert_eq!((a, b), (1, 2));
        assert_eq!(heap.take(a).unwrap(), "apple");
        assert!(heap.get(a).is_err());
        assert_eq!(heap.alloc("cherry"), 1);
        assert_eq!(heap.get(0).unwrap(), "");
        assert_eq!(heap.live_count(), 2);
    }

    #[test]
    fn copies_are_independent() {
        let mut heap = StringHeap::new();
        let a = heap.alloc("lamp");
        let b = heap.copy(a).unwrap();
        heap.free(a);
        assert_eq!(heap.get(b).unwrap(), "lamp");
    }

    #[test]
    fn restored_heap_keeps_handles() {
        let heap =
            StringHeap::from_entries(vec![(3, "c".to_string()), (1, "a".to_string())]).unwrap();
        assert_eq!(heap.get(3).unwrap(), "c");
        assert_eq!(heap.get(1).unwrap(), "a");
        let mut heap = heap;
        assert_eq!(heap.alloc("b"), 2);
        assert_eq!(heap.alloc("d"), 4);
    }

    #[test]
    fn restored_handles_are_bounded() {
        let far = (MAX_STRING_SLOTS + 1) as Aword;
        assert!(StringHeap::from_entries(vec![(far, String::new())]).is_err());
        assert!(StringHeap::from_entries(vec![(0x7FFF_FFF0, String::new())]).is_err());
        let last = MAX_STRING_SLOTS as Aword;
        assert!(StringHeap::from_entries(vec![(last, "z".to_string())]).is_ok());
    }
}
