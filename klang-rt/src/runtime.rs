//! The explicit runtime context owning heap, allocator, stack and globals.
//!
//! Every facility that the original design kept in process-wide singletons
//! lives here instead; callers construct a `Runtime` and thread it through.
//! The context is `Send` but deliberately not shared: mutating it from
//! more than one thread is outside the contract.

use klang_types::{
    Fault,
    KernelResult,
};

use crate::{
    clib,
    gdata::DataTable,
    heap::Heap,
    kaligned,
    kmalloc::Malloc,
    kstack::Stack,
    scalar::{
        Cell,
        Primitive,
    },
};

/// Default stack region size when none is given.
pub const DEFAULT_STACK_BYTES: u32 = 64 * 1024;

/// Heap, allocator, stack and global-data state as one value.
#[derive(Debug)]
pub struct Runtime {
    /// The byte heap. Public: typed loads and stores go straight to it.
    pub heap: Heap,
    malloc: Malloc,
    stack: Option<Stack>,
    data: DataTable,
}

impl Runtime {
    /// A runtime over a zeroed heap of `heap_bytes` bytes.
    pub fn new(heap_bytes: usize) -> Self {
        Self {
            heap: Heap::with_capacity(heap_bytes),
            malloc: Malloc::new(),
            stack: None,
            data: DataTable::new(),
        }
    }

    /// Allocate `size` bytes.
    pub fn malloc(&mut self, size: usize) -> KernelResult<u32> {
        self.malloc.malloc(&mut self.heap, size)
    }

    /// Allocate `count * size` zeroed bytes.
    pub fn calloc(&mut self, count: usize, size: usize) -> KernelResult<u32> {
        self.malloc.calloc(&mut self.heap, count, size)
    }

    /// Release an allocation.
    pub fn free(&mut self, addr: u32) -> KernelResult<()> {
        self.malloc.free(&mut self.heap, addr)
    }

    /// Resize an allocation, preserving the leading bytes.
    pub fn realloc(&mut self, addr: u32, new_size: usize) -> KernelResult<u32> {
        self.malloc.realloc(&mut self.heap, addr, new_size)
    }

    /// Allocate with an explicit power-of-two alignment.
    pub fn aligned_alloc(&mut self, alignment: u32, size: usize) -> KernelResult<u32> {
        kaligned::aligned_alloc(&mut self.malloc, &mut self.heap, alignment, size)
    }

    /// Release an aligned allocation.
    pub fn aligned_free(&mut self, addr: u32) -> KernelResult<()> {
        kaligned::aligned_free(&mut self.malloc, &mut self.heap, addr)
    }

    /// POSIX-shaped aligned allocation returning `(errno, addr)`.
    pub fn posix_memalign(&mut self, alignment: u32, size: usize) -> (i32, u32) {
        kaligned::posix_memalign(&mut self.malloc, &mut self.heap, alignment, size)
    }

    /// Acquire the stack region (16-byte-aligned base) and install it.
    pub fn init_stack(&mut self, size: u32) -> KernelResult<()> {
        let base = self.aligned_alloc(16, size as usize)?;
        tracing::debug!(base, size, "stack region acquired");
        self.stack = Some(Stack::new(base, size));
        Ok(())
    }

    /// Drop the stack region, returning its storage to the allocator.
    pub fn dispose_stack(&mut self) -> KernelResult<()> {
        if let Some(stack) = self.stack.take() {
            let base = stack.base();
            self.aligned_free(base)?;
            tracing::debug!(base, "stack region released");
        }
        Ok(())
    }

    fn stack_mut(&mut self) -> KernelResult<&mut Stack> {
        self.stack.as_mut().ok_or(Fault::Uninitialized)
    }

    /// The installed stack, if any.
    pub fn stack(&self) -> KernelResult<&Stack> {
        self.stack.as_ref().ok_or(Fault::Uninitialized)
    }

    /// Align the stack pointer down and snapshot it.
    pub fn push_frame(&mut self, align: u32) -> KernelResult<u32> {
        self.stack_mut()?.push_frame(align)
    }

    /// Carve stack storage in the current frame.
    pub fn alloca(&mut self, bytes: u32, align: u32) -> KernelResult<u32> {
        self.stack_mut()?.alloca(bytes, align)
    }

    /// Restore the stack pointer from a marker.
    pub fn pop_frame(&mut self, marker: u32) -> KernelResult<()> {
        self.stack_mut()?.pop_frame(marker)
    }

    /// Run `f` inside a fresh stack frame, popping on every exit path.
    pub fn with_frame<R>(
        &mut self,
        align: u32,
        f: impl FnOnce(&mut Self) -> KernelResult<R>,
    ) -> KernelResult<R> {
        let marker = self.push_frame(align)?;
        let outcome = f(self);
        // The pop happens before any error propagates.
        self.pop_frame(marker)?;
        outcome
    }

    /// Define a DATA symbol holding a copy of `initializer`.
    pub fn define_data(&mut self, name: &str, initializer: &[u8]) -> KernelResult<u32> {
        self.data
            .define_data(&mut self.malloc, &mut self.heap, name, initializer)
    }

    /// Define a zeroed BSS symbol of `len` bytes.
    pub fn define_bss(&mut self, name: &str, len: usize) -> KernelResult<u32> {
        self.data
            .define_bss(&mut self.malloc, &mut self.heap, name, len)
    }

    /// Address of a defined global symbol.
    pub fn address_of(&self, name: &str) -> KernelResult<u32> {
        self.data.address_of(name)
    }

    /// Release every global symbol.
    pub fn dispose_data(&mut self) -> KernelResult<()> {
        self.data.dispose(&mut self.malloc, &mut self.heap)
    }

    /// Duplicate the C string at `addr` into fresh storage.
    pub fn strdup(&mut self, addr: u32) -> KernelResult<u32> {
        clib::strdup(&mut self.malloc, &mut self.heap, addr)
    }

    /// Allocate a NUL-terminated copy of a Rust string.
    pub fn cstr_new(&mut self, s: &str) -> KernelResult<u32> {
        clib::cstr_new(&mut self.malloc, &mut self.heap, s)
    }

    /// A heap-backed typed cell.
    pub fn heap_cell<T: Primitive>(&mut self) -> KernelResult<Cell<T>> {
        Ok(Cell::at(self.malloc(T::SIZE)?))
    }

    /// A stack-backed typed cell in the current frame.
    #[allow(clippy::cast_possible_truncation)]
    pub fn stack_cell<T: Primitive>(&mut self) -> KernelResult<Cell<T>> {
        Ok(Cell::at(self.alloca(T::SIZE as u32, T::SIZE as u32)?))
    }

    /// A global typed cell registered under `name`.
    pub fn global_cell<T: Primitive>(&mut self, name: &str) -> KernelResult<Cell<T>> {
        Ok(Cell::at(self.define_bss(name, T::SIZE)?))
    }
}
