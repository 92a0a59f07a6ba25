use mintseal_codec::instruction::TOKEN_PROGRAM_ID;
use mintseal_codec::{
    decode_mint_account, decode_mint_account_text, default_registry, InstructionInput,
    MintAccountBuilder,
};
use mintseal_core::{bytes_to_base64, Address, Encoding};

fn mint_with_extensions(count: usize) -> Vec<u8> {
    let mut builder = MintAccountBuilder::new()
        .supply(1_000_000)
        .decimals(6)
        .mint_authority(Some(Address::new([1; 32])));
    for i in 0..count {
        builder = builder.extension((i % 200) as u8 + 1, vec![i as u8; 48]);
    }
    builder.build()
}

#[divan::bench(args = [0, 8, 64])]
fn bench_decode_mint(bencher: divan::Bencher, extensions: usize) {
    let data = mint_with_extensions(extensions);
    bencher
        .counter(divan::counter::BytesCount::new(data.len()))
        .bench(|| decode_mint_account(divan::black_box(&data)).unwrap());
}

#[divan::bench(args = [0, 8, 64])]
fn bench_decode_mint_base64(bencher: divan::Bencher, extensions: usize) {
    let text = bytes_to_base64(&mint_with_extensions(extensions));
    bencher
        .counter(divan::counter::BytesCount::new(text.len()))
        .bench(|| decode_mint_account_text(divan::black_box(&text), Encoding::Base64).unwrap());
}

#[divan::bench]
fn bench_decode_transfer(bencher: divan::Bencher) {
    let mut data = vec![3];
    data.extend_from_slice(&100_000_000_000u64.to_le_bytes());
    let input = InstructionInput::new(
        TOKEN_PROGRAM_ID.parse().unwrap(),
        data,
        vec![Address::new([1; 32]), Address::new([2; 32]), Address::new([3; 32])],
    );
    let registry = default_registry();
    bencher.bench(|| registry.decode_for_program(divan::black_box(&input)).unwrap());
}

fn main() {
    divan::main();
}
