#![no_main]
use arbitrary::Arbitrary;
use dockenv_archive::{basename, strip_char_class, strip_prefix};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    path: String,
    name: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let base = basename(&input.path);

    let stripped = strip_char_class(&input.name, base);
    assert!(input.name.ends_with(stripped));
    // Stripping again with the same basename changes nothing.
    assert_eq!(strip_char_class(stripped, base), stripped);

    let stripped = strip_prefix(&input.name, base);
    assert!(input.name.ends_with(stripped));
});
