mod util;
use util::core_cycles;

use bnglv::bn254;
use bnglv::naf::{naf, wnaf};
use num_bigint::BigUint;
use sha2::{Sha256, Digest};

fn make_scalars() -> Vec<BigUint> {
    let z = core_cycles();
    let p = bn254();
    let mut sh = Sha256::new();
    (0..128u64).map(|i| {
        sh.update(z.to_le_bytes());
        sh.update(i.to_le_bytes());
        BigUint::from_bytes_le(&sh.finalize_reset()) % p.n()
    }).collect()
}

fn bench_naf() -> (f64, u8) {
    let kk = make_scalars();
    let mut tt = [0; 100];
    let mut x = 0u8;
    for i in 0..tt.len() {
        let begin = core_cycles();
        for k in kk.iter() {
            x ^= naf(k).weight() as u8;
        }
        let end = core_cycles();
        tt[i] = end.wrapping_sub(begin);
    }
    tt.sort();
    ((tt[tt.len() >> 1] as f64) / 128.0, x)
}

fn bench_wnaf(width: u32) -> (f64, u8) {
    let kk = make_scalars();
    let mut tt = [0; 100];
    let mut x = 0u8;
    for i in 0..tt.len() {
        let begin = core_cycles();
        for k in kk.iter() {
            x ^= wnaf(k, width).unwrap().weight() as u8;
        }
        let end = core_cycles();
        tt[i] = end.wrapping_sub(begin);
    }
    tt.sort();
    ((tt[tt.len() >> 1] as f64) / 128.0, x)
}

fn main() {
    let mut bx = 0u8;

    let (v, x) = bench_naf();
    bx ^= x;
    println!("naf (256-bit):                 {:13.2}", v);
    for w in [4u32, 5, 6].iter() {
        let (v, x) = bench_wnaf(*w);
        bx ^= x;
        println!("wnaf{} (256-bit):               {:13.2}", w, v);
    }

    println!("{}", bx);
}
