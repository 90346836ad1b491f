//! End-to-end behaviour of the typed wrapper.

use approx::assert_relative_eq;
use lietensor::prelude::*;
use pretty_assertions::assert_eq;
use std::f64::consts::FRAC_PI_2;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn so3(values: Vec<f64>) -> LieTensor {
    LieTensor::new(GroupType::so3, Batch::from_vec(&[3], values).unwrap()).unwrap()
}

#[test]
fn test_zero_rotation_is_identity() {
    init_logger();
    let x = so3(vec![0.0, 0.0, 0.0]).exp().unwrap();
    assert_eq!(x.gtype(), GroupType::SO3);
    assert_eq!(x.data().element(0), &[0.0, 0.0, 0.0, 1.0]);

    let a = identity(GroupType::SO3, &[]).log().unwrap();
    assert_eq!(a.data().element(0), &[0.0, 0.0, 0.0]);
}

#[test]
fn test_pure_translation_twist() {
    init_logger();
    let xi = LieTensor::new(
        GroupType::se3,
        Batch::from_vec(&[6], vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0]).unwrap(),
    )
    .unwrap();
    let t = xi.exp().unwrap().translation().unwrap();
    assert_eq!(t.shape(), vec![4]);
    assert_eq!(t.data().element(0), &[1.0, 2.0, 3.0, 1.0]);
}

#[test]
fn test_pose_times_inverse() {
    init_logger();
    let x = random(GroupType::SE3, &[5], 1.0).unwrap();
    let e = x.mul(&x.inv().unwrap()).unwrap();
    assert_eq!(e.shape(), vec![5, 7]);
    assert_relative_eq!(e.data(), identity(GroupType::SE3, &[5]).data(), epsilon = 1e-12);
}

#[test]
fn test_rotating_points() {
    init_logger();
    let p = Tensor::from_vec(&[3], vec![1.0, 0.0, 0.0]).unwrap();
    let moved = identity(GroupType::SO3, &[]).act(&p).unwrap();
    assert_eq!(moved.data().element(0), &[1.0, 0.0, 0.0]);

    let quarter = so3(vec![0.0, 0.0, FRAC_PI_2]).exp().unwrap();
    let moved = quarter.act(&p).unwrap();
    assert_relative_eq!(moved.data().element(0), &[0.0, 1.0, 0.0][..], epsilon = 1e-12);

    let homogeneous = Tensor::from_vec(&[4], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let moved = quarter.act(&homogeneous).unwrap();
    assert_relative_eq!(moved.data().element(0), &[0.0, 1.0, 0.0, 1.0][..], epsilon = 1e-12);
}

#[test]
fn test_matrix_columns() {
    let quarter = so3(vec![0.0, 0.0, FRAC_PI_2]).exp().unwrap();
    let m = quarter.matrix().unwrap();
    assert_eq!(m.shape(), vec![4, 4]);
    let expected = [
        0.0, -1.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];
    assert_relative_eq!(m.data().element(0), &expected[..], epsilon = 1e-12);
}

#[test]
fn test_broadcast_mul() {
    let x = random(GroupType::SO3, &[4, 1], 0.5).unwrap();
    let y = random(GroupType::SO3, &[3], 0.5).unwrap();
    let z = x.mul(&y).unwrap();
    assert_eq!(z.batch_shape(), &[4, 3]);
    assert_eq!(z.shape(), vec![4, 3, 4]);

    let empty = identity(GroupType::SO3, &[0]);
    assert_eq!(empty.mul(&empty).unwrap().shape(), vec![0, 4]);
    let err = empty.mul(&y).unwrap_err();
    assert!(matches!(err, LieError::BroadcastIncompatible { .. }));
}

#[test]
fn test_retraction_matches_exp_mul() {
    let x = random(GroupType::SE3, &[2], 0.5).unwrap();
    let a = randn(GroupType::SE3, &[2], 0.3).unwrap();
    let step = LieTensor::new(GroupType::se3, a.data().clone()).unwrap().exp().unwrap();
    let expected = step.mul(&x).unwrap();
    assert_relative_eq!(x.retr(&a).unwrap().data(), expected.data(), epsilon = 1e-12);
}

#[test]
fn test_quaternion_of_pose() {
    let raw = Batch::from_vec(&[7], vec![1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
    let x = make(GroupType::SE3, raw).unwrap();
    let q = x.quaternion().unwrap();
    let h = std::f64::consts::FRAC_1_SQRT_2;
    assert_relative_eq!(q.data().element(0), &[0.0, 0.0, h, h][..], epsilon = 1e-15);
}

#[test]
fn test_adj_and_transpose_are_dual() {
    let x = random(GroupType::SE3, &[3], 0.7).unwrap();
    let u = randn(GroupType::SE3, &[3], 1.0).unwrap();
    let v = randn(GroupType::SE3, &[3], 1.0).unwrap();
    let lhs = x.adj(&u).unwrap().data().dot(v.data()).unwrap();
    let rhs = u.data().dot(x.adj_t(&v).unwrap().data()).unwrap();
    assert_relative_eq!(lhs, rhs, epsilon = 1e-10, max_relative = 1e-10);
}
