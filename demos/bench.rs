use std::{env, ptr::NonNull, str::FromStr, time::Instant};

use flist::FreeListAllocator;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Benchmark parameters, all optional positional arguments:
///
/// `bench [trials] [pct_get] [pct_large] [small_limit] [large_limit] [seed]`
struct Params {
  trials: usize,
  pct_get: u32,
  pct_large: u32,
  small_limit: usize,
  large_limit: usize,
  seed: Option<u64>,
}

fn arg<T: FromStr>(
  args: &[String],
  index: usize,
  default: T,
) -> T {
  args
    .get(index)
    .and_then(|value| value.parse().ok())
    .unwrap_or(default)
}

impl Params {
  fn from_args() -> Self {
    let args: Vec<String> = env::args().collect();

    Self {
      trials: arg(&args, 1, 10_000),
      pct_get: arg(&args, 2, 50),
      pct_large: arg(&args, 3, 10),
      small_limit: arg(&args, 4, 200),
      large_limit: arg(&args, 5, 20_000),
      seed: args.get(6).and_then(|value| value.parse().ok()),
    }
  }
}

/// Writes a recognizable pattern over the first 16 bytes of a block.
unsafe fn fill(
  address: NonNull<u8>,
  size: usize,
) {
  unsafe { address.as_ptr().write_bytes(0xFE, size.min(16)) };
}

fn report(
  allocator: &FreeListAllocator,
  start: Instant,
) {
  println!(
    "Total CPU time used by the bench test is {:.6} seconds.",
    start.elapsed().as_secs_f64()
  );
  println!("{}", allocator.stats());
}

fn main() {
  env_logger::init();

  let params = Params::from_args();
  let mut rng = match params.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };

  println!(
    "Running bench for {} trials, {}% getmem calls.",
    params.trials, params.pct_get
  );

  let mut allocator = FreeListAllocator::new();
  let mut blocks: Vec<NonNull<u8>> = Vec::with_capacity(params.trials);
  let report_every = (params.trials / 10).max(1);
  let start = Instant::now();

  for trial in 1..=params.trials {
    if rng.gen_range(1..=100) <= params.pct_get {
      let size = if rng.gen_range(1..=100) <= params.pct_large {
        rng.gen_range(params.small_limit + 1..=params.large_limit.max(params.small_limit + 1))
      } else {
        rng.gen_range(1..=params.small_limit.max(1))
      };

      match allocator.allocate(size) {
        Some(address) => {
          unsafe { fill(address, size) };
          blocks.push(address);
        }
        None => eprintln!("allocation of {size} bytes failed"),
      }
    } else if !blocks.is_empty() {
      let index = rng.gen_range(0..blocks.len());
      let address = blocks.swap_remove(index);
      unsafe { allocator.free(Some(address)) };
    }

    if trial % report_every == 0 || trial == params.trials {
      report(&allocator, start);
    }
  }
}
