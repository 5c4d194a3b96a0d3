use anyhow::{Context, Result};
use cowmat::{matrix, Matrix};
use log::{info, LevelFilter};
use rand::seq::SliceRandom;
use rand::thread_rng;

const DEFAULT_STEPS: usize = 10;

// 7 places x 4 transitions.
fn incidence() -> Matrix<i32> {
    matrix![
        [-1, 0, 0, 1],
        [1, -1, 0, 0],
        [-1, 0, 1, 0],
        [0, 1, -1, 0],
        [-1, 0, 0, 1],
        [0, 0, 1, -1],
        [1, -1, 0, 0],
    ]
}

fn firing(t: usize, transitions: usize) -> Matrix<i32> {
    Matrix::from_fn(transitions, 1, |r, _| i32::from(r == t))
}

fn fire(c: &Matrix<i32>, marking: &Matrix<i32>, t: usize) -> Option<Matrix<i32>> {
    let next = marking + &(c * &firing(t, c.cols()));
    if next.iter().any(|tokens| *tokens < 0) {
        return None;
    }
    Some(next)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or("COWMAT_LOG", "warn"))
        .init();

    let steps = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("invalid step count {:?}", arg))?,
        None => DEFAULT_STEPS,
    };

    let c = incidence();
    let mut marking = Matrix::from_columns(&[[1, 0, 1, 0, 1, 0, 3]]);
    println!("C =\n{}\n", c);
    println!("m0 = {}", marking.transposed());

    let mut rng = thread_rng();
    for step in 1..=steps {
        let enabled: Vec<(usize, Matrix<i32>)> = c
            .column_indices()
            .filter_map(|t| fire(&c, &marking, t).map(|m| (t, m)))
            .collect();
        let (t, next) = match enabled.choose(&mut rng) {
            Some(choice) => choice.clone(),
            None => {
                info!("no transition enabled after {} steps", step - 1);
                break;
            }
        };
        marking = next;
        println!("m{} = {}  (fired t{})", step, marking.transposed(), t);
    }
    Ok(())
}
