//! Basic usage example for the untracked `SuperUnion`.
//!
//! The union does not remember which member was written last, so the caller tracks it.

use variant_unions::super_union;

type Bits = super_union![u32, [u8; 4], f32];

fn main() {
    println!("Member types: {:?}", Bits::variant_types());
    println!("Size: {} bytes", size_of::<Bits>());

    let mut bits = Bits::new::<f32, _>(1.0);

    // SAFETY: Every bit pattern is a valid u32.
    let raw = unsafe { *bits.get::<u32, _>() };
    println!("1.0_f32 as bits: {raw:#010x}");

    bits.set_at::<1>([0x12, 0x34, 0x56, 0x78]);

    // SAFETY: Every bit pattern is a valid u32.
    let raw = unsafe { *bits.get_at::<0>() };
    println!("Bytes read as u32: {raw:#010x}");
}
