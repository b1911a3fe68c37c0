//! Basic usage example for `TaggedUnion`.
//!
//! Stores values of two number types in turn, reads them back by type and by index, and shows
//! what happens when the wrong type is requested.

use variant_unions::TaggedUnion;

type Number = TaggedUnion<(i32, f64)>;

fn main() {
    let mut number = Number::from_value::<i32, _>(-2);

    println!("Declared types: {:?}", Number::variant_types());
    println!("Holding: {number:?}");

    if let Some(value) = number.get::<i32, _>() {
        println!("Read as i32: {value}");
    }

    match number.try_get::<f64, _>() {
        Ok(value) => println!("Read as f64: {value}"),
        Err(error) => println!("Read as f64 failed: {error}"),
    }

    // A value of the other type replaces the stored one.
    number.set::<f64, _>(3.75);

    println!("Holding: {number:?}");

    if let Some(value) = number.get_at::<1>() {
        println!("Read at index 1: {value}");
    }

    println!(
        "Read at index 0: {}",
        number
            .get_at::<0>()
            .map_or_else(|| "nothing".to_owned(), i32::to_string)
    );

    // A union can also point at another union of its own type.
    let pointer = Number::from_self_pointer(&raw const number);

    println!(
        "Pointer union stores a pointer to itself: {}",
        pointer.storing_pointer_to_self()
    );

    number.clear();

    println!("After clear, empty: {}", number.is_empty());
}
