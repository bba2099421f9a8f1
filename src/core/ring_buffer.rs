//! Lock-Free Single-Producer Single-Consumer (SPSC) Ring Buffer
//!
//! Implementasi menggunakan Lamport Queue dengan memory ordering yang tepat.
//! Tidak ada Mutex, tidak ada alokasi setelah inisialisasi.
//!
//! Kapasitas logis ditentukan saat runtime; jumlah slot dibulatkan ke power
//! of 2 supaya indexing tetap memakai mask.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Slot dalam ring buffer
struct Slot<T> {
    data: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    const fn new() -> Self {
        Self {
            data: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Lock-Free SPSC Ring Buffer
///
/// Head (producer) dan tail (consumer) di cache line terpisah untuk
/// menghindari false sharing. `push`/`pop` adalah `unsafe`: caller wajib
/// menjamin hanya ada satu producer dan satu consumer. `channel` menegakkan
/// ini lewat tipe (`Producer`/`Consumer` tidak `Clone` dan tidak `Sync`).
#[repr(C)]
pub struct RingBuffer<T> {
    // Producer side
    head: CacheLinePadded<AtomicUsize>,
    // Consumer side
    tail: CacheLinePadded<AtomicUsize>,
    closed: AtomicBool,
    buffer: Box<[Slot<T>]>,
    mask: usize,
    capacity: usize,
}

// SAFETY: RingBuffer aman untuk Send/Sync karena:
// - `push`/`pop` unsafe; kontraknya satu producer (menulis head) dan satu
//   consumer (menulis tail)
// - Method safe lainnya hanya membaca atomics
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Membuat ring buffer dengan kapasitas logis `capacity`.
    ///
    /// # Panics
    /// Panic jika `capacity == 0`
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be non-zero");

        let slots = capacity.next_power_of_two();
        let mut buffer = Vec::with_capacity(slots);
        for _ in 0..slots {
            buffer.push(Slot::new());
        }

        Self {
            head: CacheLinePadded::new(AtomicUsize::new(0)),
            tail: CacheLinePadded::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
            buffer: buffer.into_boxed_slice(),
            mask: slots - 1,
            capacity,
        }
    }

    /// Push data ke buffer (Producer side)
    ///
    /// Returns `Err(value)` jika buffer penuh.
    ///
    /// # Safety
    /// Tidak boleh ada dua `push` yang berjalan bersamaan: semua push harus
    /// datang dari satu producer pada satu waktu.
    #[inline(always)]
    pub unsafe fn push(&self, value: T) -> Result<(), T> {
        let head = self.head.value.load(Ordering::Relaxed);
        let tail = self.tail.value.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= self.capacity {
            return Err(value);
        }

        let slot = &self.buffer[head & self.mask];

        // SAFETY: slot ini sudah dibaca consumer (atau belum pernah ditulis)
        unsafe {
            (*slot.data.get()).write(value);
        }

        // Release: write di atas visible sebelum head di-update
        self.head
            .value
            .store(head.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// Pop data dari buffer (Consumer side)
    ///
    /// # Safety
    /// Tidak boleh ada dua `pop` yang berjalan bersamaan: dua pop pada slot
    /// yang sama berarti satu value dibaca (dan di-drop) dua kali.
    #[inline(always)]
    pub unsafe fn pop(&self) -> Option<T> {
        let tail = self.tail.value.load(Ordering::Relaxed);
        let head = self.head.value.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let slot = &self.buffer[tail & self.mask];

        // SAFETY: slot sudah ditulis producer dan tidak sedang ditulis
        let value = unsafe { (*slot.data.get()).assume_init_read() };

        self.tail
            .value
            .store(tail.wrapping_add(1), Ordering::Release);

        Some(value)
    }

    /// Tandai buffer closed. Returns `true` hanya untuk pemanggil pertama.
    #[inline(always)]
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        let tail = self.tail.value.load(Ordering::Acquire);
        let head = self.head.value.load(Ordering::Acquire);
        tail == head
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Drop item yang belum dikonsumsi
        // SAFETY: &mut self, tidak ada producer/consumer lain
        while unsafe { self.pop() }.is_some() {}
    }
}
