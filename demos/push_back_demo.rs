use std::time::Instant;

use cacheline_collections::ByteString;
use cacheline_collections::CacheLine;
use cacheline_collections::DynArray;
use cacheline_collections::FingerprintMap;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    /// Initial capacity requested for every array.
    #[arg(short = 'r', long = "reserve", default_value_t = 32)]
    reserve: usize,

    /// Number of keys inserted into the fingerprint map.
    #[arg(short = 'k', long = "keys", default_value_t = 1000)]
    keys: usize,

    /// Override the detected cache-line size, in bytes. Zero means unknown.
    #[arg(short = 'l', long = "cache_line")]
    cache_line: Option<usize>,
}

const PUSH_COUNTS: &[usize] = &[
    1, 2, 4, 8, 16, 32, 128, 256, 512, 1000, 4000, 16000, 100000, 200000,
];

fn main() {
    let args = Args::parse();

    let line = match args.cache_line {
        Some(bytes) => CacheLine::new(bytes),
        None => CacheLine::detect(),
    };
    println!("cache line in bytes: {}", line.bytes());

    let mut array = DynArray::with_capacity_in(1, line);
    for i in 0..16 {
        array.push(i);
    }
    println!(
        "16 pushes after reserving 1: {:?} (capacity {})",
        array,
        array.capacity()
    );

    println!("Pushing with reserve {}...", args.reserve);
    for &count in PUSH_COUNTS {
        let before = Instant::now();
        let mut array = DynArray::with_capacity_in(args.reserve, line);
        for i in 0..count {
            array.push(i);
        }
        let dyn_array_nanos = before.elapsed().as_nanos();

        let before = Instant::now();
        let mut vec = Vec::with_capacity(args.reserve);
        for i in 0..count {
            vec.push(i);
        }
        let vec_nanos = before.elapsed().as_nanos();

        println!(
            "{count:>7} pushes: dyn_array {dyn_array_nanos:>10} ns, vec {vec_nanos:>10} ns (capacity {} vs {})",
            array.capacity(),
            vec.capacity()
        );
    }

    println!("Empty string: [{}]", ByteString::new());
    let greeting = ByteString::from("Hello, ").appended("appended World!");
    println!("{greeting}");

    let mut map = FingerprintMap::with_table_size_and_hasher_in(
        cacheline_collections::fingerprint_map::DEFAULT_TABLE_SIZE,
        cacheline_collections::fingerprint::BuildDjb2,
        line,
    );
    map.insert("hola dict", 42);
    map.insert("hola dict 2", 43);
    for i in 0..args.keys {
        map.insert(format!("key_{i}"), i);
    }
    println!(
        "find(\"hola dict\") = {:?}, find(\"nope\") = {:?}",
        map.find("hola dict"),
        map.find("nope")
    );

    map.debug_stats().print();
    println!("Probe histogram: {:?}", map.probe_histogram());

    println!("Done.");
}
