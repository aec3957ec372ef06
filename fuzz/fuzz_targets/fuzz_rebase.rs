#![no_main]
use dockenv_archive::{rebase, summarize, RebaseContext, StripMode};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as an incoming archive: must never panic, and whatever is
// accepted must come out as a readable archive with the same entry count.
fuzz_target!(|data: &[u8]| {
    let ctx = RebaseContext::new("/data/logs", StripMode::CharClass);
    let Ok(output) = rebase(data, &ctx) else {
        return;
    };

    let before = summarize(data).map(|l| l.len());
    let after = summarize(output.as_slice()).expect("rebased archive must decode");
    if let Ok(before) = before {
        assert_eq!(before, after.len());
    }
});
