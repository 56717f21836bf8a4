use oxide_mlp::ActivationFunction::Sigmoid;
use oxide_mlp::{Datum, Network};

fn main() {
    let mut network = Network::from_topology(2, 1, &[4], &[Sigmoid, Sigmoid, Sigmoid])
        .expect("valid topology");

    let data = vec![
        Datum::new(vec![1.0, 0.0], vec![1.0]),
        Datum::new(vec![0.0, 1.0], vec![1.0]),
        Datum::new(vec![0.0, 0.0], vec![0.0]),
        Datum::new(vec![1.0, 1.0], vec![0.0]),
    ];

    let eta = 0.2;
    let momentum = 0.5;
    let passes = 20_000;

    for pass in 0..passes {
        let error = network
            .train_online(&data, eta, momentum)
            .expect("training pass");
        if pass % 2000 == 0 {
            println!("Pass {pass}: error = {error:.6}");
        }
    }

    for datum in &data {
        let output = network.classify(datum.input()).expect("classification");
        println!(
            "Input: {:?} -> Output: {:.4} (target {:.0})",
            datum.input(),
            output[0],
            datum.target()[0]
        );
    }
}
