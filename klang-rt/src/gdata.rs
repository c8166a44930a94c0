//! DATA/BSS name table: named, aligned global storage.
//!
//! DATA symbols copy an initializer into their storage; BSS symbols are
//! zeroed on definition. Addresses stay stable until the table is
//! disposed, which releases every symbol's storage.

use alloc::string::{
    String,
    ToString,
};

use hashbrown::HashMap;
use klang_types::{
    Fault,
    KernelResult,
};

use crate::{
    heap::Heap,
    kaligned,
    kmalloc::Malloc,
};

/// Symbol storage is 8-byte aligned.
const SYMBOL_ALIGN: u32 = 8;

/// Name → aligned-address table.
#[derive(Debug, Default, Clone)]
pub struct DataTable {
    symbols: HashMap<String, u32>,
}

impl DataTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Define a DATA symbol holding a copy of `initializer`.
    pub fn define_data(
        &mut self,
        malloc: &mut Malloc,
        heap: &mut Heap,
        name: &str,
        initializer: &[u8],
    ) -> KernelResult<u32> {
        let addr = self.reserve(malloc, heap, name, initializer.len().max(1))?;
        heap.write(addr, initializer.len())?.copy_from_slice(initializer);
        Ok(addr)
    }

    /// Define a BSS symbol of `len` zeroed bytes.
    pub fn define_bss(
        &mut self,
        malloc: &mut Malloc,
        heap: &mut Heap,
        name: &str,
        len: usize,
    ) -> KernelResult<u32> {
        let addr = self.reserve(malloc, heap, name, len.max(1))?;
        heap.memset(addr, 0, len)?;
        Ok(addr)
    }

    /// Address of a defined symbol.
    pub fn address_of(&self, name: &str) -> KernelResult<u32> {
        self.symbols.get(name).copied().ok_or(Fault::SymbolNotFound)
    }

    /// Release every symbol and clear the table.
    pub fn dispose(&mut self, malloc: &mut Malloc, heap: &mut Heap) -> KernelResult<()> {
        for (_, addr) in self.symbols.drain() {
            kaligned::aligned_free(malloc, heap, addr)?;
        }
        Ok(())
    }

    fn reserve(
        &mut self,
        malloc: &mut Malloc,
        heap: &mut Heap,
        name: &str,
        len: usize,
    ) -> KernelResult<u32> {
        if self.symbols.contains_key(name) {
            return Err(Fault::DuplicateSymbol);
        }
        let addr = kaligned::aligned_alloc(malloc, heap, SYMBOL_ALIGN, len)?;
        tracing::debug!(name, addr, len, "defined global symbol");
        self.symbols.insert(name.to_string(), addr);
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (Heap, Malloc, DataTable) {
        (Heap::with_capacity(1 << 16), Malloc::new(), DataTable::new())
    }

    #[test]
    fn data_symbols_copy_their_initializer() {
        let (mut heap, mut malloc, mut table) = arena();
        let addr = table
            .define_data(&mut malloc, &mut heap, "greeting", b"Hello\0")
            .unwrap();
        assert_eq!(addr % 8, 0);
        assert_eq!(heap.read(addr, 6).unwrap(), b"Hello\0");
        assert_eq!(table.address_of("greeting").unwrap(), addr);
    }

    #[test]
    fn bss_symbols_are_zeroed() {
        let (mut heap, mut malloc, mut table) = arena();
        // Dirty the arena first so the zeroing is observable.
        let scratch = malloc.malloc(&mut heap, 256).unwrap();
        heap.memset(scratch, 0xFF, 256).unwrap();
        malloc.free(&mut heap, scratch).unwrap();

        let addr = table
            .define_bss(&mut malloc, &mut heap, "buffer", 128)
            .unwrap();
        assert!(heap.read(addr, 128).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut heap, mut malloc, mut table) = arena();
        table
            .define_bss(&mut malloc, &mut heap, "twice", 8)
            .unwrap();
        assert_eq!(
            table.define_data(&mut malloc, &mut heap, "twice", &[1]),
            Err(Fault::DuplicateSymbol)
        );
        assert_eq!(table.address_of("missing"), Err(Fault::SymbolNotFound));
    }

    #[test]
    fn dispose_releases_storage() {
        let (mut heap, mut malloc, mut table) = arena();
        table
            .define_bss(&mut malloc, &mut heap, "a", 64)
            .unwrap();
        table
            .define_data(&mut malloc, &mut heap, "b", &[1, 2, 3])
            .unwrap();
        table.dispose(&mut malloc, &mut heap).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.address_of("a"), Err(Fault::SymbolNotFound));
    }
}
