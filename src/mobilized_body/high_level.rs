//! Composite calculations: inertia about arbitrary points, momentum, and
//! point-to-point distance with its time derivatives.

use glam::DVec3;

use super::MobilizedBody;
use crate::core::inertia::Inertia;
use crate::core::types::Transform;
use crate::error::Result;
use crate::state::State;
use crate::utils::spatial::{
    find_relative_acceleration, find_relative_velocity, SpatialMat, SpatialVec,
};

impl<'t> MobilizedBody<'t> {
    /// 6x6 spatial inertia about B's origin, expressed in Ground. Ground
    /// itself reports an infinite diagonal.
    pub fn calc_body_spatial_inertia_matrix_in_ground(&self, state: &State) -> Result<SpatialMat> {
        if self.is_ground() {
            self.check_state(state)?;
            return Ok(SpatialMat::infinite_diagonal());
        }
        let r_gb = self.body_rotation(state)?;
        Ok(self.body_mass_properties(state)?.reexpress(&r_gb).to_spatial_mat())
    }

    /// Inertia about B's mass center, expressed in B.
    pub fn calc_body_central_inertia(&self, state: &State) -> Result<Inertia> {
        Ok(self.body_mass_properties(state)?.calc_central_inertia())
    }

    /// Inertia of B about `station_a` of body A, expressed in A.
    pub fn calc_body_inertia_about_another_body_station(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
        station_a: DVec3,
    ) -> Result<Inertia> {
        let mp = self.body_mass_properties(state)?;
        let r_ab = self.find_body_rotation_in_another_body(state, in_a)?;
        let central_a = mp.calc_central_inertia().reexpress(&r_ab);
        let mass_center_a = self.find_mass_center_location_in_another_body(state, in_a)?;
        Ok(central_a.shift_from_mass_center(station_a - mass_center_a, mp.mass()))
    }

    /// Angular momentum about B's origin and linear momentum, in Ground.
    pub fn calc_body_momentum_about_body_origin_in_ground(
        &self,
        state: &State,
    ) -> Result<SpatialVec> {
        if self.is_ground() {
            self.check_state(state)?;
            return Ok(SpatialVec::ZERO);
        }
        let v_gb = self.body_velocity(state)?;
        Ok(self.body_spatial_inertia_in_ground(state)?.mul_vec(v_gb))
    }

    /// Angular momentum about B's mass center and linear momentum, in Ground.
    pub fn calc_body_momentum_about_body_mass_center_in_ground(
        &self,
        state: &State,
    ) -> Result<SpatialVec> {
        if self.is_ground() {
            self.check_state(state)?;
            return Ok(SpatialVec::ZERO);
        }
        let mp = self.body_mass_properties(state)?;
        let r_gb = self.body_rotation(state)?;
        let w = self.body_angular_velocity(state)?;
        let v_bc = self.find_station_velocity_in_ground(state, mp.mass_center())?;
        let central_g = mp.calc_central_inertia().reexpress(&r_gb);
        Ok(SpatialVec::new(central_g * w, v_bc * mp.mass()))
    }

    // Fixed stations

    pub fn calc_station_to_station_distance(
        &self,
        state: &State,
        station_b: DVec3,
        other_a: &MobilizedBody<'_>,
        station_a: DVec3,
    ) -> Result<f64> {
        self.check_same_tree(other_a)?;
        if self.is_same_mobilized_body(other_a) {
            return Ok((station_a - station_b).length());
        }
        let p_b = self.find_station_location_in_ground(state, station_b)?;
        let p_a = other_a.find_station_location_in_ground(state, station_a)?;
        Ok((p_a - p_b).length())
    }

    /// Rate of change of the distance between two stations. When the points
    /// coincide this is the magnitude of their relative velocity.
    pub fn calc_station_to_station_distance_time_derivative(
        &self,
        state: &State,
        station_b: DVec3,
        other_a: &MobilizedBody<'_>,
        station_a: DVec3,
    ) -> Result<f64> {
        self.check_same_tree(other_a)?;
        if self.is_same_mobilized_body(other_a) {
            self.body_velocity(state)?;
            return Ok(0.0);
        }
        let (p_b, v_b) = self.find_station_location_and_velocity_in_ground(state, station_b)?;
        let (p_a, v_a) = other_a.find_station_location_and_velocity_in_ground(state, station_a)?;
        Ok(distance_rate(p_a - p_b, v_a - v_b))
    }

    /// Second time derivative of the distance between two stations. When the
    /// points coincide it is the relative acceleration projected on the
    /// direction of relative velocity, or the relative acceleration magnitude
    /// if they are also at relative rest.
    pub fn calc_station_to_station_distance_2nd_time_derivative(
        &self,
        state: &State,
        station_b: DVec3,
        other_a: &MobilizedBody<'_>,
        station_a: DVec3,
    ) -> Result<f64> {
        self.check_same_tree(other_a)?;
        if self.is_same_mobilized_body(other_a) {
            self.body_acceleration(state)?;
            return Ok(0.0);
        }
        let (p_b, v_b, a_b) =
            self.find_station_location_velocity_and_acceleration_in_ground(state, station_b)?;
        let (p_a, v_a, a_a) =
            other_a.find_station_location_velocity_and_acceleration_in_ground(state, station_a)?;
        Ok(distance_acceleration(p_a - p_b, v_a - v_b, a_a - a_b))
    }

    // Points moving on B. `velocity_b` and `acceleration_b` are the point's
    // derivatives taken in B and expressed in B.

    fn moving_point_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
        velocity_b: DVec3,
        acceleration_b: DVec3,
    ) -> Result<(DVec3, DVec3, DVec3)> {
        let (p, v_fixed, a_fixed) =
            self.find_station_location_velocity_and_acceleration_in_ground(state, station_b)?;
        let r_gb = self.body_rotation(state)?;
        let w = self.body_angular_velocity(state)?;
        let v_rel = r_gb * velocity_b;
        Ok((
            p,
            v_fixed + v_rel,
            a_fixed + r_gb * acceleration_b + 2.0 * w.cross(v_rel),
        ))
    }

    fn moving_point_location_and_velocity_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
        velocity_b: DVec3,
    ) -> Result<(DVec3, DVec3)> {
        let (p, v_fixed) = self.find_station_location_and_velocity_in_ground(state, station_b)?;
        Ok((p, v_fixed + self.body_rotation(state)? * velocity_b))
    }

    /// Velocity in A of a point moving on B, expressed in A.
    pub fn calc_body_moving_point_velocity_in_body(
        &self,
        state: &State,
        station_b: DVec3,
        velocity_b: DVec3,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.check_same_tree(in_a)?;
        let (p, v) =
            self.moving_point_location_and_velocity_in_ground(state, station_b, velocity_b)?;
        if in_a.is_ground() {
            return Ok(v);
        }
        let x_gp = Transform::from_translation(p);
        let v_gp = SpatialVec::new(DVec3::ZERO, v);
        Ok(find_relative_velocity(
            &in_a.body_transform(state)?,
            &in_a.body_velocity(state)?,
            &x_gp,
            &v_gp,
        )
        .lin)
    }

    /// Acceleration in A of a point moving on B, as a derivative taken in A
    /// and expressed in A.
    pub fn calc_body_moving_point_acceleration_in_body(
        &self,
        state: &State,
        station_b: DVec3,
        velocity_b: DVec3,
        acceleration_b: DVec3,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.check_same_tree(in_a)?;
        let (p, v, a) = self.moving_point_in_ground(state, station_b, velocity_b, acceleration_b)?;
        if in_a.is_ground() {
            return Ok(a);
        }
        // Only the point's linear motion enters the linear result.
        let x_gp = Transform::from_translation(p);
        let v_gp = SpatialVec::new(DVec3::ZERO, v);
        let a_gp = SpatialVec::new(DVec3::ZERO, a);
        Ok(find_relative_acceleration(
            &in_a.body_transform(state)?,
            &in_a.body_velocity(state)?,
            &in_a.body_acceleration(state)?,
            &x_gp,
            &v_gp,
            &a_gp,
        )
        .lin)
    }

    pub fn calc_moving_point_to_point_distance_time_derivative(
        &self,
        state: &State,
        station_b: DVec3,
        velocity_b: DVec3,
        other_a: &MobilizedBody<'_>,
        station_a: DVec3,
        velocity_a: DVec3,
    ) -> Result<f64> {
        self.check_same_tree(other_a)?;
        let (p_b, v_b) =
            self.moving_point_location_and_velocity_in_ground(state, station_b, velocity_b)?;
        let (p_a, v_a) =
            other_a.moving_point_location_and_velocity_in_ground(state, station_a, velocity_a)?;
        Ok(distance_rate(p_a - p_b, v_a - v_b))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn calc_moving_point_to_point_distance_2nd_time_derivative(
        &self,
        state: &State,
        station_b: DVec3,
        velocity_b: DVec3,
        acceleration_b: DVec3,
        other_a: &MobilizedBody<'_>,
        station_a: DVec3,
        velocity_a: DVec3,
        acceleration_a: DVec3,
    ) -> Result<f64> {
        self.check_same_tree(other_a)?;
        let (p_b, v_b, a_b) =
            self.moving_point_in_ground(state, station_b, velocity_b, acceleration_b)?;
        let (p_a, v_a, a_a) =
            other_a.moving_point_in_ground(state, station_a, velocity_a, acceleration_a)?;
        Ok(distance_acceleration(p_a - p_b, v_a - v_b, a_a - a_b))
    }
}

/// `d/dt |r|` given `r` and `v = dr/dt`.
fn distance_rate(r: DVec3, v: DVec3) -> f64 {
    let d = r.length();
    if d == 0.0 {
        v.length()
    } else {
        v.dot(r) / d
    }
}

/// `d²/dt² |r|` given `r`, `v`, and `a`.
fn distance_acceleration(r: DVec3, v: DVec3, a: DVec3) -> f64 {
    let d = r.length();
    if d == 0.0 {
        let s = v.length();
        return if s == 0.0 { a.length() } else { a.dot(v) / s };
    }
    let u = r / d;
    let v_perp = v - u * v.dot(u);
    a.dot(u) + v_perp.dot(v) / d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_rate_projects_on_separation() {
        assert_relative_eq!(
            distance_rate(DVec3::new(2.0, 0.0, 0.0), DVec3::new(3.0, 4.0, 0.0)),
            3.0
        );
        assert_relative_eq!(distance_rate(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn distance_acceleration_branches() {
        let a = DVec3::new(0.0, 0.0, -2.0);
        assert_relative_eq!(distance_acceleration(DVec3::ZERO, DVec3::ZERO, a), 2.0);
        assert_relative_eq!(distance_acceleration(DVec3::ZERO, DVec3::Z, a), -2.0);
    }

    #[test]
    fn distance_acceleration_of_circular_motion_is_zero() {
        // Point circling the origin at unit radius and unit speed.
        let r = DVec3::X;
        let v = DVec3::Y;
        let a = -DVec3::X;
        assert_relative_eq!(distance_acceleration(r, v, a), 0.0, epsilon = 1e-15);
    }
}
