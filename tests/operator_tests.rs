use approx::assert_relative_eq;
use mobod::{
    BodyNode, DQuat, DVec3, MassProperties, MatterTree, MobilizedBodyIndex, MobilizerType,
    MultibodyError, Rotation, Stage, State, Transform, TreeConfig,
};

/// Two independent branches off Ground so that A and B move relative to each other.
fn two_branches() -> (MatterTree, MobilizedBodyIndex, MobilizedBodyIndex) {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let a = tree
        .add_body(
            BodyNode::new("a", MobilizedBodyIndex::GROUND, MobilizerType::Free)
                .with_mass_properties(
                    MassProperties::solid_box(2.0, DVec3::new(0.5, 0.2, 0.1)).unwrap(),
                ),
        )
        .unwrap();
    let arm = tree
        .add_body(
            BodyNode::new("arm", MobilizedBodyIndex::GROUND, MobilizerType::Ball)
                .with_inboard_frame(Transform::from_translation(DVec3::new(0.0, 0.0, 1.0))),
        )
        .unwrap();
    let b = tree
        .add_body(
            BodyNode::new("b", arm, MobilizerType::Pin)
                .with_inboard_frame(Transform::new(
                    Rotation::about_x(0.4),
                    DVec3::new(1.0, 0.0, 0.0),
                ))
                .with_mass_properties(
                    MassProperties::point_mass(1.5, DVec3::new(0.3, 0.1, 0.0)).unwrap(),
                ),
        )
        .unwrap();
    (tree, a, b)
}

fn moving_state(tree: &MatterTree) -> State {
    let mut state = tree.create_state();
    let qa = DQuat::from_axis_angle(DVec3::new(0.2, 1.0, -0.3).normalize(), 0.9);
    let qb = DQuat::from_axis_angle(DVec3::new(1.0, 0.0, 1.0).normalize(), 0.5);
    state
        .set_q(&[qa.w, qa.x, qa.y, qa.z, 0.5, -1.0, 2.0, qb.w, qb.x, qb.y, qb.z, 0.7])
        .unwrap();
    state
        .set_u(&[0.3, -0.2, 1.1, 0.5, 0.0, -0.4, -0.6, 0.8, 0.2, 1.7])
        .unwrap();
    tree.realize(&mut state, Stage::Acceleration).unwrap();
    state
}

#[test]
fn body_transform_in_itself_is_identity() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    for idx in [a, b] {
        let body = tree.mobilized_body(idx).unwrap();
        let x = body.find_body_transform_in_another_body(&state, &body).unwrap();
        assert!(x.abs_diff_eq(&Transform::IDENTITY, 1e-12));
    }
}

#[test]
fn relative_velocity_is_antisymmetric_under_role_swap() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    let body_a = tree.mobilized_body(a).unwrap();
    let body_b = tree.mobilized_body(b).unwrap();

    let v_ab = body_b.find_body_velocity_in_another_body(&state, &body_a).unwrap();
    let v_ba = body_a.find_body_velocity_in_another_body(&state, &body_b).unwrap();
    let r_ab = body_b.find_body_rotation_in_another_body(&state, &body_a).unwrap();
    let p_ab = body_b.find_body_origin_location_in_another_body(&state, &body_a).unwrap();

    let w_expected = -(r_ab * v_ba.ang);
    assert!(v_ab.ang.abs_diff_eq(w_expected, 1e-12));
    let v_expected = -(r_ab * v_ba.lin) + v_ab.ang.cross(p_ab);
    assert!(v_ab.lin.abs_diff_eq(v_expected, 1e-12), "{:?} vs {v_expected:?}", v_ab.lin);
}

#[test]
fn relative_angular_velocity_matches_spatial_velocity() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    let body_a = tree.mobilized_body(a).unwrap();
    let body_b = tree.mobilized_body(b).unwrap();
    let w = body_b.find_body_angular_velocity_in_another_body(&state, &body_a).unwrap();
    let v = body_b.find_body_velocity_in_another_body(&state, &body_a).unwrap();
    assert!(w.abs_diff_eq(v.ang, 1e-12));
}

#[test]
fn station_queries_agree_with_body_queries_at_origin() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    let body_a = tree.mobilized_body(a).unwrap();
    let body_b = tree.mobilized_body(b).unwrap();

    let origin_v = body_b.find_body_origin_velocity_in_another_body(&state, &body_a).unwrap();
    let station_v = body_b
        .find_station_velocity_in_another_body(&state, DVec3::ZERO, &body_a)
        .unwrap();
    assert!(origin_v.abs_diff_eq(station_v, 1e-12));

    let origin_a = body_b.find_body_origin_acceleration_in_another_body(&state, &body_a).unwrap();
    let station_a = body_b
        .find_station_acceleration_in_another_body(&state, DVec3::ZERO, &body_a)
        .unwrap();
    assert!(origin_a.abs_diff_eq(station_a, 1e-10));
}

#[test]
fn station_maps_between_bodies_consistently() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    let body_a = tree.mobilized_body(a).unwrap();
    let body_b = tree.mobilized_body(b).unwrap();
    let s_b = DVec3::new(0.1, -0.4, 0.25);
    let in_a = body_b.find_station_location_in_another_body(&state, s_b, &body_a).unwrap();
    let back = body_b.find_station_at_another_body_station(&state, &body_a, in_a).unwrap();
    assert!(back.abs_diff_eq(s_b, 1e-12));

    let c_g = body_b.find_mass_center_location_in_ground(&state).unwrap();
    let c_in_a = body_a.find_station_at_another_body_mass_center(&state, &body_b).unwrap();
    assert!(body_a
        .find_station_location_in_ground(&state, c_in_a)
        .unwrap()
        .abs_diff_eq(c_g, 1e-12));
}

#[test]
fn vector_expression_round_trips() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    let body_a = tree.mobilized_body(a).unwrap();
    let body_b = tree.mobilized_body(b).unwrap();
    let v_b = DVec3::new(1.0, 2.0, 3.0);
    let v_g = body_b.express_vector_in_ground_frame(&state, v_b).unwrap();
    assert!(body_b
        .express_ground_vector_in_body_frame(&state, v_g)
        .unwrap()
        .abs_diff_eq(v_b, 1e-12));
    let v_a = body_b.express_vector_in_another_body_frame(&state, v_b, &body_a).unwrap();
    assert!(body_a.express_vector_in_ground_frame(&state, v_a).unwrap().abs_diff_eq(v_g, 1e-12));
}

#[test]
fn handles_from_different_trees_are_rejected() {
    let (tree1, _, b1) = two_branches();
    let (tree2, a2, _) = two_branches();
    let state = moving_state(&tree1);
    let body_b = tree1.mobilized_body(b1).unwrap();
    let foreign = tree2.mobilized_body(a2).unwrap();
    assert!(matches!(
        body_b.find_body_transform_in_another_body(&state, &foreign),
        Err(MultibodyError::InvalidReference(_))
    ));
    assert!(matches!(
        body_b.calc_station_to_station_distance(&state, DVec3::ZERO, &foreign, DVec3::ZERO),
        Err(MultibodyError::InvalidReference(_))
    ));
    assert_ne!(body_b, foreign);
    assert!(!body_b.is_same_mobilized_body(&foreign));
}

#[test]
fn ground_is_identified_by_index() {
    let (tree, a, _) = two_branches();
    assert!(tree.ground().is_ground());
    assert!(!tree.mobilized_body(a).unwrap().is_ground());
    assert_eq!(tree.ground(), tree.mobilized_body(MobilizedBodyIndex::GROUND).unwrap());
}

/// Slider with a point at its origin and a Ground station at the same place.
fn slider_at_origin(force: f64) -> (MatterTree, State, MobilizedBodyIndex) {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let s = tree
        .add_body(BodyNode::new("slider", MobilizedBodyIndex::GROUND, MobilizerType::Slider))
        .unwrap();
    let mut state = tree.create_state();
    state.set_mobility_forces(&[force]).unwrap();
    tree.realize(&mut state, Stage::Acceleration).unwrap();
    (tree, state, s)
}

#[test]
fn distance_second_derivative_degenerates_to_relative_acceleration_magnitude() {
    let (tree, state, s) = slider_at_origin(-3.0);
    let slider = tree.mobilized_body(s).unwrap();
    let ground = tree.ground();
    assert_eq!(
        slider
            .calc_station_to_station_distance(&state, DVec3::ZERO, &ground, DVec3::ZERO)
            .unwrap(),
        0.0
    );
    assert_eq!(
        slider
            .calc_station_to_station_distance_time_derivative(
                &state,
                DVec3::ZERO,
                &ground,
                DVec3::ZERO,
            )
            .unwrap(),
        0.0
    );
    let d2 = slider
        .calc_station_to_station_distance_2nd_time_derivative(
            &state,
            DVec3::ZERO,
            &ground,
            DVec3::ZERO,
        )
        .unwrap();
    assert_relative_eq!(d2, 3.0, epsilon = 1e-12);
}

#[test]
fn distance_rate_of_separated_points() {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let s = tree
        .add_body(BodyNode::new("slider", MobilizedBodyIndex::GROUND, MobilizerType::Slider))
        .unwrap();
    let mut state = tree.create_state();
    state.set_q(&[2.0]).unwrap();
    state.set_u(&[0.5]).unwrap();
    tree.realize(&mut state, Stage::Acceleration).unwrap();
    let slider = tree.mobilized_body(s).unwrap();
    let ground = tree.ground();
    // Ground station straight above the slider origin's path.
    let g = DVec3::new(0.0, 1.0, 0.0);
    let d = slider.calc_station_to_station_distance(&state, DVec3::ZERO, &ground, g).unwrap();
    assert_relative_eq!(d, 5.0_f64.sqrt(), epsilon = 1e-12);
    let d_dot = slider
        .calc_station_to_station_distance_time_derivative(&state, DVec3::ZERO, &ground, g)
        .unwrap();
    // d = sqrt(x² + 1), d' = x x' / d
    assert_relative_eq!(d_dot, 2.0 * 0.5 / 5.0_f64.sqrt(), epsilon = 1e-12);
    let d_ddot = slider
        .calc_station_to_station_distance_2nd_time_derivative(&state, DVec3::ZERO, &ground, g)
        .unwrap();
    // d'' = x'² / d - x² x'² / d³ with x'' = 0
    let expected = 0.25 / 5.0_f64.sqrt() - 4.0 * 0.25 / 5.0_f64.powi(3).sqrt();
    assert_relative_eq!(d_ddot, expected, epsilon = 1e-12);
}

#[test]
fn moving_point_on_spinning_body() {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let p = tree
        .add_body(BodyNode::new("disk", MobilizedBodyIndex::GROUND, MobilizerType::Pin))
        .unwrap();
    let mut state = tree.create_state();
    state.set_u(&[1.0]).unwrap();
    tree.realize(&mut state, Stage::Acceleration).unwrap();
    let disk = tree.mobilized_body(p).unwrap();
    let ground = tree.ground();

    let v = disk
        .calc_body_moving_point_velocity_in_body(&state, DVec3::X, DVec3::Y, &ground)
        .unwrap();
    assert!(v.abs_diff_eq(DVec3::new(0.0, 2.0, 0.0), 1e-12));
    let a = disk
        .calc_body_moving_point_acceleration_in_body(
            &state,
            DVec3::X,
            DVec3::Y,
            DVec3::ZERO,
            &ground,
        )
        .unwrap();
    assert!(a.abs_diff_eq(DVec3::new(-3.0, 0.0, 0.0), 1e-12));

    // Seen from the disk itself only the relative motion remains.
    let v_self = disk
        .calc_body_moving_point_velocity_in_body(&state, DVec3::X, DVec3::Y, &disk)
        .unwrap();
    assert!(v_self.abs_diff_eq(DVec3::Y, 1e-12));
    let a_self = disk
        .calc_body_moving_point_acceleration_in_body(&state, DVec3::X, DVec3::Y, DVec3::Z, &disk)
        .unwrap();
    assert!(a_self.abs_diff_eq(DVec3::Z, 1e-12));
}

#[test]
fn moving_point_distance_matches_fixed_station_version_at_zero_relative_motion() {
    let (tree, a, b) = two_branches();
    let state = moving_state(&tree);
    let body_a = tree.mobilized_body(a).unwrap();
    let body_b = tree.mobilized_body(b).unwrap();
    let s_b = DVec3::new(0.2, 0.0, 0.1);
    let s_a = DVec3::new(-0.3, 0.4, 0.0);
    let fixed = body_b
        .calc_station_to_station_distance_2nd_time_derivative(&state, s_b, &body_a, s_a)
        .unwrap();
    let moving = body_b
        .calc_moving_point_to_point_distance_2nd_time_derivative(
            &state,
            s_b,
            DVec3::ZERO,
            DVec3::ZERO,
            &body_a,
            s_a,
            DVec3::ZERO,
            DVec3::ZERO,
        )
        .unwrap();
    assert_relative_eq!(fixed, moving, epsilon = 1e-12);
    let fixed_rate = body_b
        .calc_station_to_station_distance_time_derivative(&state, s_b, &body_a, s_a)
        .unwrap();
    let moving_rate = body_b
        .calc_moving_point_to_point_distance_time_derivative(
            &state,
            s_b,
            DVec3::ZERO,
            &body_a,
            s_a,
            DVec3::ZERO,
        )
        .unwrap();
    assert_relative_eq!(fixed_rate, moving_rate, epsilon = 1e-12);
}

#[test]
fn momentum_about_mass_center_of_translating_body() {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let t = tree
        .add_body(
            BodyNode::new("t", MobilizedBodyIndex::GROUND, MobilizerType::Translation)
                .with_mass_properties(
                    MassProperties::point_mass(2.0, DVec3::new(0.0, 1.0, 0.0)).unwrap(),
                ),
        )
        .unwrap();
    let mut state = tree.create_state();
    state.set_u(&[3.0, 0.0, 0.0]).unwrap();
    tree.realize(&mut state, Stage::Velocity).unwrap();
    let body = tree.mobilized_body(t).unwrap();

    let about_c = body.calc_body_momentum_about_body_mass_center_in_ground(&state).unwrap();
    assert!(about_c.ang.abs_diff_eq(DVec3::ZERO, 1e-12));
    assert!(about_c.lin.abs_diff_eq(DVec3::new(6.0, 0.0, 0.0), 1e-12));

    // About the origin the offset mass center contributes c × m v.
    let about_o = body.calc_body_momentum_about_body_origin_in_ground(&state).unwrap();
    assert!(about_o.ang.abs_diff_eq(DVec3::new(0.0, 0.0, -6.0), 1e-12));
    assert!(about_o.lin.abs_diff_eq(DVec3::new(6.0, 0.0, 0.0), 1e-12));

    assert_eq!(
        tree.ground()
            .calc_body_momentum_about_body_origin_in_ground(&state)
            .unwrap(),
        mobod::SpatialVec::ZERO
    );
}

#[test]
fn inertia_about_another_body_station() {
    let mut tree = MatterTree::new(TreeConfig::zero_gravity());
    let t = tree
        .add_body(
            BodyNode::new("t", MobilizedBodyIndex::GROUND, MobilizerType::Slider)
                .with_mass_properties(MassProperties::point_mass(2.0, DVec3::ZERO).unwrap()),
        )
        .unwrap();
    let mut state = tree.create_state();
    state.set_q(&[3.0]).unwrap();
    tree.realize(&mut state, Stage::Position).unwrap();
    let body = tree.mobilized_body(t).unwrap();
    // Point mass at (3,0,0) seen from Ground's origin: m (y² + z²), m (x² + z²), m (x² + y²).
    let i = body
        .calc_body_inertia_about_another_body_station(&state, &tree.ground(), DVec3::ZERO)
        .unwrap();
    assert!(i.moments().abs_diff_eq(DVec3::new(0.0, 18.0, 18.0), 1e-12));
    let central = body.calc_body_central_inertia(&state).unwrap();
    assert!(central.moments().abs_diff_eq(DVec3::ZERO, 1e-12));
    let ground_inertia = tree.ground().calc_body_spatial_inertia_matrix_in_ground(&state).unwrap();
    assert!(ground_inertia.m11.x_axis.x.is_infinite());
}
