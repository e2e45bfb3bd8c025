use anyhow::{Context, Result};
use bounded_iter::{init_tracing_once, BoundedIter};

fn main() -> Result<()> {
    init_tracing_once();

    let mut input = vec![1, 2, 3, 4];
    let iter = BoundedIter::new().with_max_concurrency(input.len() / 2);

    iter.for_each(&mut input, |v| {
        if *v % 2 != 0 {
            *v = -1;
        }
    });
    println!("{:?}", input);

    let mut lengths = vec![0usize; 3];
    let words = ["alpha", "beta", "gamma"];
    iter.try_for_each_indexed(&mut lengths, |i, len| {
        let word = words.get(i).context("index out of range")?;
        *len = word.len();
        Ok(())
    })?;
    println!("{:?}", lengths);

    Ok(())
}
