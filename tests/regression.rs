use std::collections::HashMap;

use anyhow::Result;
use symreg::{
    evaluate, generate, point_crossover, point_mutation, predict, rmse, Dataset, FunctionSpec,
    FunctionSymbol, GrowMethod, Node, SymregError, TerminalSpec, Tree,
};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn dataset(x: &[f64], response: &[f64]) -> Result<Dataset> {
    let mut inputs = HashMap::new();
    inputs.insert("x".to_string(), x.to_vec());
    Ok(Dataset::new(inputs, response.to_vec())?)
}

/// ADD(CONST(1.0), INPUT("x")) over x = [1,1,1] evaluates to [2,2,2].
#[test]
fn add_scenario_evaluates_to_two() -> Result<()> {
    let mut tree = Tree::new();
    let root = tree.set_root(Node::func(FunctionSymbol::Add))?;
    tree.attach(root, 0, Node::constant(1.0))?;
    tree.attach(root, 1, Node::input("x"))?;

    let data = dataset(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0])?;
    assert_eq!(predict(&tree, &data)?, vec![2.0, 2.0, 2.0]);

    let score = evaluate(&mut tree, &data)?;
    assert_eq!(score, 0.0);
    assert_eq!(tree.error, 0.0);
    Ok(())
}

#[test]
fn rmse_scenarios_are_exact() {
    assert_eq!(rmse(&[2.0, 2.0, 2.0], &[2.0, 2.0, 2.0]), 0.0);
    assert_eq!(rmse(&[3.0, 3.0, 3.0], &[2.0, 2.0, 2.0]), 1.0);
}

#[test]
fn constant_root_broadcasts_over_any_row_count() -> Result<()> {
    for n in [1usize, 3, 17] {
        let mut tree = Tree::new();
        tree.set_root(Node::constant(4.25))?;
        let data = dataset(&vec![0.0; n], &vec![0.0; n])?;
        assert_eq!(predict(&tree, &data)?, vec![4.25; n]);
    }
    Ok(())
}

#[test]
fn div_by_zero_degrades_fitness_without_error() -> Result<()> {
    // DIV(0, x) computes x / 0 under the stack operand order.
    let mut tree = Tree::new();
    let root = tree.set_root(Node::func(FunctionSymbol::Div))?;
    tree.attach(root, 0, Node::constant(0.0))?;
    tree.attach(root, 1, Node::input("x"))?;

    let data = dataset(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0])?;
    let predicted = predict(&tree, &data)?;
    assert!(predicted.iter().all(|v| !v.is_finite()));

    let score = evaluate(&mut tree, &data)?;
    assert!(!score.is_finite());
    Ok(())
}

#[test]
fn operators_compose_over_generated_trees() -> Result<()> {
    let fs = FunctionSpec::default_set();
    let ts = TerminalSpec::default_set();
    let mut rng = StdRng::seed_from_u64(99);
    let data = dataset(&[1.0; 10], &[2.0; 10])?;

    for _ in 0..20 {
        let mut a = generate(GrowMethod::RampedHalfAndHalf, &fs, &ts, 3, &mut rng)?;
        let mut b = generate(GrowMethod::RampedHalfAndHalf, &fs, &ts, 3, &mut rng)?;
        let total = a.size + b.size;

        point_crossover(&mut a, &mut b, &mut rng)?;
        a.refresh();
        b.refresh();
        assert_eq!(a.size + b.size, total);
        a.validate()?;
        b.validate()?;

        point_mutation(&fs, &ts, &mut a, &mut rng)?;
        a.validate()?;

        // Still evaluable after surgery; score may be degenerate but never an error.
        evaluate(&mut a, &data)?;
        evaluate(&mut b, &data)?;
    }
    Ok(())
}

#[test]
fn dataset_shape_mismatch_is_rejected() {
    let mut inputs = HashMap::new();
    inputs.insert("x".to_string(), vec![1.0, 2.0]);
    let err = Dataset::new(inputs, vec![1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, SymregError::DatasetShapeMismatch(_)));
}

#[test]
fn tree_json_round_trip_preserves_semantics() -> Result<()> {
    let fs = FunctionSpec::default_set();
    let ts = TerminalSpec::default_set();
    let mut rng = StdRng::seed_from_u64(7);
    let tree = generate(GrowMethod::Full, &fs, &ts, 3, &mut rng)?;
    let data = dataset(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0])?;

    let json = serde_json::to_string(&tree)?;
    let restored: Tree = serde_json::from_str(&json)?;

    assert_eq!(restored.equation(), tree.equation());
    assert_eq!(restored.size, tree.size);
    let a = predict(&tree, &data)?;
    let b = predict(&restored, &data)?;
    for (x, y) in a.iter().zip(&b) {
        assert!((x == y) || (x.is_nan() && y.is_nan()));
    }
    Ok(())
}
