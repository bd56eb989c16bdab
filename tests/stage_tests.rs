use mobod::{
    BodyNode, DVec3, MassProperties, MatterTree, MobilizedBodyIndex, MobilizerType, MultibodyError,
    Stage, Transform, TreeConfig,
};

fn three_body_chain() -> MatterTree {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let a = tree
        .add_body(BodyNode::new("a", MobilizedBodyIndex::GROUND, MobilizerType::Pin))
        .unwrap();
    let b = tree
        .add_body(
            BodyNode::new("b", a, MobilizerType::Pin)
                .with_inboard_frame(Transform::from_translation(DVec3::X)),
        )
        .unwrap();
    tree.add_body(
        BodyNode::new("c", b, MobilizerType::Slider)
            .with_inboard_frame(Transform::from_translation(DVec3::X)),
    )
    .unwrap();
    tree
}

#[test]
fn changing_one_q_invalidates_every_body() {
    let tree = three_body_chain();
    let mut state = tree.create_state();
    tree.realize(&mut state, Stage::Velocity).unwrap();

    let tip = tree.mobilized_body(MobilizedBodyIndex(3)).unwrap();
    let root = tree.mobilized_body(MobilizedBodyIndex(1)).unwrap();
    assert!(tip.body_transform(&state).is_ok());

    root.set_one_q(&mut state, 0, 0.5).unwrap();
    assert_eq!(state.stage(), Stage::Time);
    for body in tree.bodies() {
        let err = body.body_transform(&state).unwrap_err();
        assert!(matches!(
            err,
            MultibodyError::StageViolation {
                required: Stage::Position,
                current: Stage::Time,
                ..
            }
        ));
    }
    // q itself is readable without realization.
    assert_eq!(root.one_q(&state, 0).unwrap(), 0.5);
}

#[test]
fn changing_u_keeps_positions_valid() {
    let tree = three_body_chain();
    let mut state = tree.create_state();
    tree.realize(&mut state, Stage::Velocity).unwrap();
    let tip = tree.mobilized_body(MobilizedBodyIndex(3)).unwrap();
    tip.set_one_u(&mut state, 0, 2.0).unwrap();
    assert!(tip.body_transform(&state).is_ok());
    assert!(matches!(
        tip.body_velocity(&state),
        Err(MultibodyError::StageViolation { required: Stage::Velocity, .. })
    ));
}

#[test]
fn realization_is_idempotent() {
    let tree = three_body_chain();
    let mut state = tree.create_state();
    state.set_q(&[0.3, -0.2, 0.7]).unwrap();
    state.set_u(&[1.0, 0.5, -0.25]).unwrap();
    tree.realize(&mut state, Stage::Velocity).unwrap();

    let tip = tree.mobilized_body(MobilizedBodyIndex(3)).unwrap();
    let x1 = tip.body_transform(&state).unwrap();
    let v1 = tip.body_velocity(&state).unwrap();
    tree.realize(&mut state, Stage::Velocity).unwrap();
    tree.realize(&mut state, Stage::Position).unwrap();
    assert_eq!(state.stage(), Stage::Velocity);
    assert_eq!(tip.body_transform(&state).unwrap(), x1);
    assert_eq!(tip.body_velocity(&state).unwrap(), v1);
}

#[test]
fn acceleration_queries_need_acceleration_stage() {
    let tree = three_body_chain();
    let mut state = tree.create_state();
    tree.realize(&mut state, Stage::Dynamics).unwrap();
    let tip = tree.mobilized_body(MobilizedBodyIndex(3)).unwrap();
    assert!(matches!(
        tip.body_acceleration(&state),
        Err(MultibodyError::StageViolation {
            required: Stage::Acceleration,
            current: Stage::Dynamics,
            ..
        })
    ));
    assert!(state.udot().is_err());
    tree.realize(&mut state, Stage::Acceleration).unwrap();
    assert_eq!(state.udot().unwrap().len(), 3);
}

#[test]
fn mass_properties_need_instance_stage() {
    let tree = three_body_chain();
    let mut state = tree.create_state();
    let a = tree.mobilized_body(MobilizedBodyIndex(1)).unwrap();
    assert!(a.body_mass(&state).is_err());
    tree.realize(&mut state, Stage::Instance).unwrap();
    assert_eq!(a.body_mass(&state).unwrap(), 1.0);
}

#[test]
fn topology_change_makes_state_stale_until_realized() {
    let mut tree = three_body_chain();
    let mut state = tree.create_state();
    state.set_q(&[0.1, 0.2, 0.3]).unwrap();
    tree.realize(&mut state, Stage::Position).unwrap();

    tree.mobilized_body_mut(MobilizedBodyIndex(2))
        .unwrap()
        .set_default_mass_properties(MassProperties::point_mass(2.0, DVec3::X).unwrap())
        .unwrap();

    let b = tree.mobilized_body(MobilizedBodyIndex(2)).unwrap();
    assert!(matches!(b.body_transform(&state), Err(MultibodyError::StaleTopology { .. })));

    tree.realize(&mut state, Stage::Instance).unwrap();
    assert_eq!(state.q(), &[0.1, 0.2, 0.3]);
    assert_eq!(b.body_mass(&state).unwrap(), 2.0);
}

#[test]
fn decorations_do_not_stale_the_state() {
    let mut tree = three_body_chain();
    let mut state = tree.create_state();
    tree.realize(&mut state, Stage::Position).unwrap();
    tree.mobilized_body_mut(MobilizedBodyIndex(1))
        .unwrap()
        .add_outboard_decoration(Transform::IDENTITY, mobod::GeometryId(1));
    assert!(tree.check_state(&state).is_ok());
}

#[test]
fn state_from_another_tree_is_rejected() {
    let tree1 = three_body_chain();
    let tree2 = three_body_chain();
    let mut state2 = tree2.create_state();
    tree2.realize(&mut state2, Stage::Position).unwrap();
    let b = tree1.mobilized_body(MobilizedBodyIndex(1)).unwrap();
    assert!(matches!(b.body_transform(&state2), Err(MultibodyError::InvalidReference(_))));
}

#[test]
fn time_change_only_drops_to_instance() {
    let tree = three_body_chain();
    let mut state = tree.create_state();
    tree.realize(&mut state, Stage::Acceleration).unwrap();
    state.set_time(1.5);
    assert_eq!(state.stage(), Stage::Instance);
    assert_eq!(state.time(), 1.5);
}
