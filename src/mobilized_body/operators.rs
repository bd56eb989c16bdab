//! Closed-form kinematic relations between this body B, another body A of
//! the same tree, and Ground.
//!
//! Naming follows the frames involved: `find_*` computes a quantity from
//! realized Ground-frame data, `express_*` only re-expresses a vector.
//! Stations are points fixed on a body, measured from its origin and
//! expressed in its frame.

use glam::DVec3;

use super::MobilizedBody;
use crate::core::inertia::MassProperties;
use crate::core::types::{Rotation, Transform};
use crate::error::Result;
use crate::state::State;
use crate::utils::spatial::{find_relative_acceleration, find_relative_velocity, SpatialVec};

impl<'t> MobilizedBody<'t> {
    // Body frame relative to another body

    /// `X_AB = ~X_GA X_GB`
    pub fn find_body_transform_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<Transform> {
        self.check_same_tree(in_a)?;
        let x_gb = self.body_transform(state)?;
        if in_a.is_ground() {
            return Ok(x_gb);
        }
        Ok(in_a.body_transform(state)?.inverse() * x_gb)
    }

    pub fn find_body_rotation_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<Rotation> {
        self.check_same_tree(in_a)?;
        let r_gb = self.body_rotation(state)?;
        if in_a.is_ground() {
            return Ok(r_gb);
        }
        Ok(in_a.body_rotation(state)?.transpose() * r_gb)
    }

    pub fn find_body_origin_location_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        Ok(self.find_body_transform_in_another_body(state, in_a)?.position)
    }

    /// Angular velocity of B in A and velocity of B's origin in A, expressed in A.
    pub fn find_body_velocity_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<SpatialVec> {
        self.check_same_tree(in_a)?;
        let v_gb = self.body_velocity(state)?;
        if in_a.is_ground() {
            return Ok(v_gb);
        }
        Ok(find_relative_velocity(
            &in_a.body_transform(state)?,
            &in_a.body_velocity(state)?,
            &self.body_transform(state)?,
            &v_gb,
        ))
    }

    pub fn find_body_angular_velocity_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.check_same_tree(in_a)?;
        let w_gb = self.body_angular_velocity(state)?;
        if in_a.is_ground() {
            return Ok(w_gb);
        }
        let r_ga = in_a.body_rotation(state)?;
        Ok(r_ga.transpose() * (w_gb - in_a.body_angular_velocity(state)?))
    }

    pub fn find_body_origin_velocity_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        Ok(self.find_body_velocity_in_another_body(state, in_a)?.lin)
    }

    /// Angular acceleration of B in A and acceleration of B's origin in A,
    /// both as derivatives taken in A and expressed in A.
    pub fn find_body_acceleration_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<SpatialVec> {
        self.check_same_tree(in_a)?;
        let a_gb = self.body_acceleration(state)?;
        if in_a.is_ground() {
            return Ok(a_gb);
        }
        Ok(find_relative_acceleration(
            &in_a.body_transform(state)?,
            &in_a.body_velocity(state)?,
            &in_a.body_acceleration(state)?,
            &self.body_transform(state)?,
            &self.body_velocity(state)?,
            &a_gb,
        ))
    }

    pub fn find_body_angular_acceleration_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        Ok(self.find_body_acceleration_in_another_body(state, in_a)?.ang)
    }

    pub fn find_body_origin_acceleration_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        Ok(self.find_body_acceleration_in_another_body(state, in_a)?.lin)
    }

    // Mobilizer reaction forces, all expressed in Ground

    /// Force the mobilizer exerts on B, as moment about B's origin and force.
    pub fn find_mobilizer_reaction_on_body_at_origin_in_ground(
        &self,
        state: &State,
    ) -> Result<SpatialVec> {
        self.check_state(state)?;
        Ok(state
            .acceleration_cache(self.index, "find_mobilizer_reaction_on_body_at_origin_in_ground")?
            .reaction_on_body)
    }

    /// Same force with the moment taken about M's origin.
    pub fn find_mobilizer_reaction_on_body_at_m_in_ground(
        &self,
        state: &State,
    ) -> Result<SpatialVec> {
        let f = self.find_mobilizer_reaction_on_body_at_origin_in_ground(state)?;
        let p_bo_mo = self.body_rotation(state)? * self.outboard_frame(state)?.position;
        Ok(f.shift_force(p_bo_mo))
    }

    /// Equal and opposite force on the parent, moment about F's origin.
    pub fn find_mobilizer_reaction_on_parent_at_f_in_ground(
        &self,
        state: &State,
    ) -> Result<SpatialVec> {
        let f = self.find_mobilizer_reaction_on_body_at_origin_in_ground(state)?;
        if self.is_ground() {
            return Ok(SpatialVec::ZERO);
        }
        let x_gp = self.parent()?.body_transform(state)?;
        let p_gf = x_gp * self.inboard_frame(state)?.position;
        Ok(-f.shift_force(p_gf - self.body_origin_location(state)?))
    }

    /// Equal and opposite force on the parent, moment about P's origin.
    pub fn find_mobilizer_reaction_on_parent_at_origin_in_ground(
        &self,
        state: &State,
    ) -> Result<SpatialVec> {
        let f = self.find_mobilizer_reaction_on_body_at_origin_in_ground(state)?;
        if self.is_ground() {
            return Ok(SpatialVec::ZERO);
        }
        let p_gp = self.parent()?.body_origin_location(state)?;
        Ok(-f.shift_force(p_gp - self.body_origin_location(state)?))
    }

    // Stations

    pub fn find_station_location_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
    ) -> Result<DVec3> {
        Ok(self.body_transform(state)? * station_b)
    }

    /// Maps many stations at once; runs in parallel with the `parallel` feature.
    pub fn find_station_locations_in_ground(
        &self,
        state: &State,
        stations_b: &[DVec3],
    ) -> Result<Vec<DVec3>> {
        let x_gb = self.body_transform(state)?;
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            Ok(stations_b.par_iter().map(|s| x_gb * *s).collect())
        }
        #[cfg(not(feature = "parallel"))]
        {
            Ok(stations_b.iter().map(|s| x_gb * *s).collect())
        }
    }

    /// Location of a station of B measured from A's origin, expressed in A.
    pub fn find_station_location_in_another_body(
        &self,
        state: &State,
        station_b: DVec3,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.check_same_tree(in_a)?;
        let p_gs = self.find_station_location_in_ground(state, station_b)?;
        in_a.find_station_at_ground_point(state, p_gs)
    }

    pub fn find_station_velocity_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
    ) -> Result<DVec3> {
        let r = self.body_rotation(state)? * station_b;
        Ok(self.body_velocity(state)?.shift_velocity(r).lin)
    }

    /// Velocity in A of a station fixed on B, expressed in A.
    pub fn find_station_velocity_in_another_body(
        &self,
        state: &State,
        station_b: DVec3,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.check_same_tree(in_a)?;
        let (x_gs, v_gs) = self.station_frame_motion(state, station_b)?;
        if in_a.is_ground() {
            return Ok(v_gs.lin);
        }
        Ok(find_relative_velocity(
            &in_a.body_transform(state)?,
            &in_a.body_velocity(state)?,
            &x_gs,
            &v_gs,
        )
        .lin)
    }

    pub fn find_station_acceleration_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
    ) -> Result<DVec3> {
        let r = self.body_rotation(state)? * station_b;
        let w = self.body_angular_velocity(state)?;
        Ok(self.body_acceleration(state)?.shift_acceleration(w, r).lin)
    }

    /// Acceleration in A of a station fixed on B, as a derivative taken in A
    /// and expressed in A.
    pub fn find_station_acceleration_in_another_body(
        &self,
        state: &State,
        station_b: DVec3,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.check_same_tree(in_a)?;
        let (x_gs, v_gs) = self.station_frame_motion(state, station_b)?;
        let a_gs = SpatialVec::new(
            self.body_angular_acceleration(state)?,
            self.find_station_acceleration_in_ground(state, station_b)?,
        );
        if in_a.is_ground() {
            return Ok(a_gs.lin);
        }
        Ok(find_relative_acceleration(
            &in_a.body_transform(state)?,
            &in_a.body_velocity(state)?,
            &in_a.body_acceleration(state)?,
            &x_gs,
            &v_gs,
            &a_gs,
        )
        .lin)
    }

    pub fn find_station_location_and_velocity_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
    ) -> Result<(DVec3, DVec3)> {
        let (x_gs, v_gs) = self.station_frame_motion(state, station_b)?;
        Ok((x_gs.position, v_gs.lin))
    }

    pub fn find_station_location_velocity_and_acceleration_in_ground(
        &self,
        state: &State,
        station_b: DVec3,
    ) -> Result<(DVec3, DVec3, DVec3)> {
        let (x_gs, v_gs) = self.station_frame_motion(state, station_b)?;
        let a = self.find_station_acceleration_in_ground(state, station_b)?;
        Ok((x_gs.position, v_gs.lin, a))
    }

    /// Frame parallel to B with its origin at the station, and its spatial
    /// velocity in Ground.
    fn station_frame_motion(
        &self,
        state: &State,
        station_b: DVec3,
    ) -> Result<(Transform, SpatialVec)> {
        let x_gb = self.body_transform(state)?;
        let r = x_gb.rotation * station_b;
        let v_gs = self.body_velocity(state)?.shift_velocity(r);
        Ok((Transform::new(x_gb.rotation, x_gb.position + r), v_gs))
    }

    pub fn find_mass_center_location_in_ground(&self, state: &State) -> Result<DVec3> {
        let c = self.body_mass_center_station(state)?;
        self.find_station_location_in_ground(state, c)
    }

    pub fn find_mass_center_location_in_another_body(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        let c = self.body_mass_center_station(state)?;
        self.find_station_location_in_another_body(state, c, in_a)
    }

    /// Station of B currently located at `location_g` in Ground.
    pub fn find_station_at_ground_point(&self, state: &State, location_g: DVec3) -> Result<DVec3> {
        if self.is_ground() {
            self.check_state(state)?;
            return Ok(location_g);
        }
        Ok(self.body_transform(state)?.inverse_transform_point(location_g))
    }

    /// Station of B coincident with `station_a` of body A.
    pub fn find_station_at_another_body_station(
        &self,
        state: &State,
        from_a: &MobilizedBody<'_>,
        station_a: DVec3,
    ) -> Result<DVec3> {
        self.check_same_tree(from_a)?;
        let p_gs = from_a.find_station_location_in_ground(state, station_a)?;
        self.find_station_at_ground_point(state, p_gs)
    }

    /// Station of B coincident with A's origin.
    pub fn find_station_at_another_body_origin(
        &self,
        state: &State,
        from_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        self.find_station_at_another_body_station(state, from_a, DVec3::ZERO)
    }

    /// Station of B coincident with A's mass center.
    pub fn find_station_at_another_body_mass_center(
        &self,
        state: &State,
        from_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        let c = from_a.body_mass_center_station(state)?;
        self.find_station_at_another_body_station(state, from_a, c)
    }

    // Frames fixed on B

    /// `X_GF = X_GB X_BF`
    pub fn find_frame_transform_in_ground(
        &self,
        state: &State,
        x_bf: &Transform,
    ) -> Result<Transform> {
        Ok(self.body_transform(state)? * *x_bf)
    }

    /// Angular velocity of the frame (same as B's) and velocity of its origin.
    pub fn find_frame_velocity_in_ground(
        &self,
        state: &State,
        x_bf: &Transform,
    ) -> Result<SpatialVec> {
        let r = self.body_rotation(state)? * x_bf.position;
        Ok(self.body_velocity(state)?.shift_velocity(r))
    }

    pub fn find_frame_acceleration_in_ground(
        &self,
        state: &State,
        x_bf: &Transform,
    ) -> Result<SpatialVec> {
        let r = self.body_rotation(state)? * x_bf.position;
        let w = self.body_angular_velocity(state)?;
        Ok(self.body_acceleration(state)?.shift_acceleration(w, r))
    }

    // Re-expression

    /// `R_GB v_B`
    pub fn express_vector_in_ground_frame(&self, state: &State, v_b: DVec3) -> Result<DVec3> {
        Ok(self.body_rotation(state)? * v_b)
    }

    /// `~R_GB v_G`
    pub fn express_ground_vector_in_body_frame(&self, state: &State, v_g: DVec3) -> Result<DVec3> {
        Ok(self.body_rotation(state)?.transpose() * v_g)
    }

    /// `R_AB v_B`
    pub fn express_vector_in_another_body_frame(
        &self,
        state: &State,
        v_b: DVec3,
        in_a: &MobilizedBody<'_>,
    ) -> Result<DVec3> {
        Ok(self.find_body_rotation_in_another_body(state, in_a)? * v_b)
    }

    /// B's mass properties, still about B's origin, re-expressed in Ground.
    pub fn express_mass_properties_in_ground_frame(&self, state: &State) -> Result<MassProperties> {
        let mp = self.body_mass_properties(state)?;
        Ok(mp.reexpress(&self.body_rotation(state)?))
    }

    /// B's mass properties, still about B's origin, re-expressed in A.
    pub fn express_mass_properties_in_another_body_frame(
        &self,
        state: &State,
        in_a: &MobilizedBody<'_>,
    ) -> Result<MassProperties> {
        let mp = self.body_mass_properties(state)?;
        Ok(mp.reexpress(&self.find_body_rotation_in_another_body(state, in_a)?))
    }
}
