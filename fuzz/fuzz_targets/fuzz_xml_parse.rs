#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::parser::{parse_buffer, PushParser};

fuzz_target!(|data: &[u8]| {
    // One-shot parse should never panic
    let whole = parse_buffer(data);

    // Feeding the same bytes in two chunks must agree with the one-shot parse
    let split = data.first().map_or(0, |&b| usize::from(b) % (data.len() + 1));
    let mut parser = PushParser::new();
    let chunked = match parser.push(&data[..split], false) {
        Ok(()) => parser.push(&data[split..], true).and_then(|()| parser.finish()),
        Err(e) => Err(e),
    };
    assert_eq!(whole.is_ok(), chunked.is_ok());
});
