mod util;
use util::core_cycles;

use bnglv::{bn254, decompose};
use bnglv::verify::{Query, SearchConfig, Verifier};
use num_bigint::BigUint;
use sha2::{Sha256, Digest};

fn bench_decompose() -> (f64, u8) {
    let z = core_cycles();
    let p = bn254();
    let mut kk = Vec::with_capacity(128);
    let mut sh = Sha256::new();
    for i in 0..128u64 {
        sh.update(z.to_le_bytes());
        sh.update(i.to_le_bytes());
        kk.push(BigUint::from_bytes_le(&sh.finalize_reset()) % p.n());
    }
    let mut tt = [0; 100];
    let mut x = 0u8;
    for i in 0..tt.len() {
        let begin = core_cycles();
        for k in kk.iter() {
            let d = decompose(p, k).unwrap();
            x ^= d.k1.to_bytes_le().1[0];
        }
        let end = core_cycles();
        tt[i] = end.wrapping_sub(begin);
    }
    tt.sort();
    ((tt[tt.len() >> 1] as f64) / 128.0, x)
}

fn bench_search() -> (f64, u8) {
    let p = bn254();
    let v = Verifier::new(p, SearchConfig::search_only(4096));
    let q: Query = "k2 == 4965661367192848883".parse().unwrap();
    let mut tt = [0; 10];
    let mut x = 0u8;
    for i in 0..tt.len() {
        let begin = core_cycles();
        if v.check(&q).witness().is_some() {
            x ^= 1;
        }
        let end = core_cycles();
        tt[i] = end.wrapping_sub(begin);
    }
    tt.sort();
    (tt[tt.len() >> 1] as f64, x)
}

fn main() {
    let mut bx = 0u8;

    let (v, x) = bench_decompose();
    bx ^= x;
    println!("bn254 decompose:               {:13.2}", v);
    let (v, x) = bench_search();
    bx ^= x;
    println!("bn254 search (k2 == u+2):      {:13.2}", v);

    println!("{}", bx);
}
