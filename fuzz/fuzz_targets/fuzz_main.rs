// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use gemtext_core::{from_tokens, to_gemtext, HtmlCompiler, Node, Tokenizer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Split the input so chunk boundaries land mid-line.
    let split = data.first().map_or(0, |b| *b as usize % (data.len() + 1));
    let (head, tail) = data.split_at(split);

    let mut tokenizer = Tokenizer::new();
    let mut tokens = tokenizer.feed(head, false);
    tokens.extend(tokenizer.feed(tail, true));

    let mut compiler = HtmlCompiler::default();
    let _ = compiler.compile(&tokens);

    let root = from_tokens(&tokens);
    let _ = to_gemtext(&Node::Root(root));
});
