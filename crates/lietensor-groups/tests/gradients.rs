//! Analytic backward rules against central finite differences.
//!
//! Every registered kernel is checked at batch shapes `()`, `(1,)`, `(5, 3)`
//! and `(0,)`, plus broadcast combinations of its operands.

use lietensor_core::{Batch, GroupType};
use lietensor_groups::random::{gaussian_tangent, sample};
use lietensor_groups::{check, kernels, lookup, Kernel, Operator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

const SHAPES: [&[usize]; 4] = [&[], &[1], &[5, 3], &[0]];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gaussian(shape: &[usize], width: usize, rng: &mut StdRng) -> Batch {
    let count = shape.iter().product::<usize>() * width;
    let values = (0..count).map(|_| rng.sample(StandardNormal)).collect();
    Batch::from_elements(shape, &[width], values).unwrap()
}

fn primary(kernel: &Kernel, shape: &[usize], rng: &mut StdRng) -> Batch {
    let gtype = kernel.gtype();
    let sigma = if gtype.is_manifold() { 0.5 } else { 1.0 };
    sample(gtype, shape, sigma, rng).unwrap()
}

fn secondary(kernel: &Kernel, shape: &[usize], rng: &mut StdRng) -> Batch {
    let gtype = kernel.gtype();
    match kernel.operator() {
        Operator::Mul => sample(gtype, shape, 0.5, rng).unwrap(),
        Operator::Act3 => gaussian(shape, 3, rng),
        Operator::Act4 => gaussian(shape, 4, rng),
        _ => gaussian_tangent(gtype, shape, 1.0, rng).unwrap(),
    }
}

fn upstream(out: &Batch, rng: &mut StdRng) -> Batch {
    let count = out.numel() * out.width();
    let values = (0..count).map(|_| rng.sample(StandardNormal)).collect();
    Batch::from_elements(out.batch_shape(), out.event_shape(), values).unwrap()
}

fn assert_kernel(kernel: &Kernel, inputs: &[&Batch], rng: &mut StdRng) {
    let out = kernel.forward(inputs).unwrap();
    let grad = upstream(&out, rng);
    let report = check(kernel, inputs, &grad).unwrap();
    assert!(
        report.passed(),
        "{} on {} with shapes {:?}: {report:?}",
        kernel.operator(),
        kernel.gtype(),
        inputs.iter().map(|b| b.shape()).collect::<Vec<_>>()
    );
}

#[test]
fn test_all_kernels_all_shapes() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(2024);
    for kernel in kernels() {
        for shape in SHAPES {
            let x = primary(kernel, shape, &mut rng);
            if kernel.arity() == 1 {
                assert_kernel(kernel, &[&x], &mut rng);
            } else {
                let y = secondary(kernel, shape, &mut rng);
                assert_kernel(kernel, &[&x, &y], &mut rng);
            }
        }
    }
}

#[test]
fn test_binary_kernels_broadcast() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(99);
    let pairs: [(&[usize], &[usize]); 3] = [(&[5, 3], &[]), (&[], &[4]), (&[2, 1], &[3])];
    for kernel in kernels().into_iter().filter(|k| k.arity() == 2) {
        for (lhs, rhs) in pairs {
            let x = primary(kernel, lhs, &mut rng);
            let y = secondary(kernel, rhs, &mut rng);
            assert_kernel(kernel, &[&x, &y], &mut rng);
        }
    }
}

#[test]
fn test_small_angle_gradients() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(5);
    for gtype in [GroupType::SO3, GroupType::SE3] {
        for scale in [0.0, 1e-9, 1e-4, 0.05] {
            let a = gaussian_tangent(gtype, &[3], scale, &mut rng).unwrap();
            let x = lookup(Operator::Exp, gtype.mapping())
                .unwrap()
                .forward(&[&a])
                .unwrap();
            let v = gaussian_tangent(gtype, &[3], 1.0, &mut rng).unwrap();
            assert_kernel(lookup(Operator::Exp, gtype.mapping()).unwrap(), &[&a], &mut rng);
            assert_kernel(lookup(Operator::Log, gtype).unwrap(), &[&x], &mut rng);
            assert_kernel(lookup(Operator::Jinv, gtype).unwrap(), &[&x, &v], &mut rng);
        }
    }
}

#[test]
fn test_large_rotation_gradients() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(17);
    // Angles of 2.5 rad stay clear of the Log branch cut at π.
    let phi = Batch::from_vec(&[3], vec![0.0, 2.5, 0.0]).unwrap();
    let x = lookup(Operator::Exp, GroupType::so3)
        .unwrap()
        .forward(&[&phi])
        .unwrap();
    let v = gaussian_tangent(GroupType::SO3, &[], 1.0, &mut rng).unwrap();
    assert_kernel(lookup(Operator::Log, GroupType::SO3).unwrap(), &[&x], &mut rng);
    assert_kernel(lookup(Operator::Jinv, GroupType::SO3).unwrap(), &[&x, &v], &mut rng);
}
