use crate::core::body_node::{combine_columns, project_columns};
use crate::core::motion::{MotionMethod, MotionMethods};
use crate::core::tree::MatterTree;
use crate::error::{MultibodyError, Result};
use crate::state::{AccelerationCache, DynamicsCache, State};
use crate::utils::dense::DenseMat;
use crate::utils::ids::MobilizedBodyIndex;
use crate::utils::spatial::{transform_force, SpatialMat, SpatialVec};

/// Featherstone articulated-body algorithm over a realized State, carried
/// out in the Ground frame with every body quantity taken about its origin.
///
/// Each body obeys `P A + z = F` where `F` is the mobilizer force on the body.
/// The inward pass runs at Dynamics stage, the outward pass at Acceleration.
pub(crate) struct ABASolver;

impl ABASolver {
    /// Inward pass: gyroscopic and applied forces, then articulated inertias
    /// and bias forces accumulated from the tips toward Ground.
    pub(crate) fn articulate(tree: &MatterTree, state: &State) -> Result<Vec<DynamicsCache>> {
        let n = tree.num_bodies();
        let gravity = tree.config().gravity;
        let mut cache = Vec::with_capacity(n);
        cache.push(DynamicsCache::ground());

        for i in 1..n {
            let pos = &state.cache.position[i];
            let vel = &state.cache.velocity[i];
            let mp = &state.instance[i].mass_properties;
            let r_gb = pos.x_gb.rotation;
            let m = mp.mass();
            let c = r_gb * mp.mass_center();
            let w = vel.v_gb.ang;

            let gyroscopic = SpatialVec::new(
                w.cross(mp.inertia().reexpress(&r_gb) * w),
                w.cross(w.cross(c)) * m,
            );
            let weight = gravity * m;
            let applied = state.body_forces[i] + SpatialVec::new(c.cross(weight), weight);

            cache.push(DynamicsCache {
                gyroscopic,
                applied,
                articulated_inertia: pos.spatial_inertia,
                bias_force: gyroscopic - applied,
                p_h: Vec::new(),
                d_inv: DenseMat::zeros(0),
                u_residual: Vec::new(),
                prescribed: true,
            });
        }

        for i in (1..n).rev() {
            let node = tree.node(i);
            let layout = state.layout[i];
            let pos = &state.cache.position[i];
            let vel = &state.cache.velocity[i];
            let methods = MotionMethods::from_motion(state.instance[i].motion.as_ref());
            let p = cache[i].articulated_inertia;
            let z = cache[i].bias_force;

            let (ia, pa) = if methods.udot != MotionMethod::Free || layout.nu == 0 {
                let udot = prescribed_udot(state, i, methods.udot);
                let a_rel = vel.coriolis + combine_columns(&pos.h_g, &udot);
                (p, z + p.mul_vec(a_rel))
            } else {
                let h = &pos.h_g;
                let p_h: Vec<SpatialVec> = h.iter().map(|col| p.mul_vec(*col)).collect();
                let mut d = DenseMat::zeros(layout.nu);
                for r in 0..layout.nu {
                    for c in 0..layout.nu {
                        d.set(r, c, h[r].dot(&p_h[c]));
                    }
                }
                let d_inv = d
                    .inverse()
                    .ok_or(MultibodyError::SingularArticulatedInertia(MobilizedBodyIndex(i)))?;

                let tau = &state.mobility_forces[layout.u_range()];
                let u_residual: Vec<f64> = project_columns(h, &z)
                    .iter()
                    .zip(tau)
                    .map(|(hz, t)| t - hz)
                    .collect();

                let mut ia = p;
                for r in 0..layout.nu {
                    for c in 0..layout.nu {
                        ia = ia - SpatialMat::outer_product(p_h[r], p_h[c]) * d_inv.get(r, c);
                    }
                }
                let nu_vec = d_inv.mul_vec(&u_residual);
                let pa = z + ia.mul_vec(vel.coriolis) + combine_columns(&p_h, &nu_vec);

                let entry = &mut cache[i];
                entry.p_h = p_h;
                entry.d_inv = d_inv;
                entry.u_residual = u_residual;
                entry.prescribed = false;
                (ia, pa)
            };

            if let Some(parent) = node.parent().filter(|p| !p.is_ground()) {
                let l = pos.x_gb.position - state.cache.position[parent.0].x_gb.position;
                cache[parent.0].articulated_inertia += ia.shift_to_parent(l);
                cache[parent.0].bias_force += transform_force(pa, l);
            }
        }

        Ok(cache)
    }

    /// Outward pass: udot, body accelerations, mobilizer accelerations and
    /// qdotdot. Writes the acceleration cache into `state`.
    pub(crate) fn accelerate(tree: &MatterTree, state: &mut State) -> Result<()> {
        let n = tree.num_bodies();
        let mut udot = vec![0.0; state.u.len()];
        let mut qdotdot = vec![0.0; state.q.len()];
        let mut accel = vec![AccelerationCache::default(); n];

        for i in 1..n {
            let node = tree.node(i);
            let layout = state.layout[i];
            let pos = &state.cache.position[i];
            let vel = &state.cache.velocity[i];
            let dynamics = &state.cache.dynamics[i];
            let parent = node.parent().map_or(0, |p| p.0);

            let a_p = accel[parent].a_gb;
            let l = pos.x_gb.position - state.cache.position[parent].x_gb.position;
            let a_prime = SpatialVec::new(a_p.ang, a_p.lin + a_p.ang.cross(l)) + vel.coriolis;

            let body_udot = if dynamics.prescribed {
                let methods = MotionMethods::from_motion(state.instance[i].motion.as_ref());
                prescribed_udot(state, i, methods.udot)
            } else {
                let rhs: Vec<f64> = dynamics
                    .u_residual
                    .iter()
                    .zip(&dynamics.p_h)
                    .map(|(r, col)| r - col.dot(&a_prime))
                    .collect();
                dynamics.d_inv.mul_vec(&rhs)
            };

            accel[i].a_gb = a_prime + combine_columns(&pos.h_g, &body_udot);
            accel[i].a_fm = combine_columns(&pos.h_fm, &body_udot) + vel.hdot_u_fm;

            let q = &state.q[layout.q_range()];
            let u = &state.u[layout.u_range()];
            node.mobilizer()
                .calc_qdotdot(q, u, &body_udot, &mut qdotdot[layout.q_range()])?;
            udot[layout.u_range()].copy_from_slice(&body_udot);
        }

        Self::reactions(tree, state, &mut accel);

        state.cache.acceleration = accel;
        state.cache.udot = udot;
        state.cache.qdotdot = qdotdot;
        Ok(())
    }

    /// Mobilizer force on each body from its body equation plus the reactions
    /// of its children: `F = M A + G - F_applied + Σ Φ F_child`.
    fn reactions(tree: &MatterTree, state: &State, accel: &mut [AccelerationCache]) {
        let n = accel.len();
        let mut from_children = vec![SpatialVec::ZERO; n];
        for i in (1..n).rev() {
            let pos = &state.cache.position[i];
            let dynamics = &state.cache.dynamics[i];
            let f = pos.spatial_inertia.mul_vec(accel[i].a_gb) + dynamics.gyroscopic
                - dynamics.applied
                + from_children[i];
            accel[i].reaction_on_body = f;
            if let Some(parent) = tree.node(i).parent().filter(|p| !p.is_ground()) {
                let l = pos.x_gb.position - state.cache.position[parent.0].x_gb.position;
                from_children[parent.0] += transform_force(f, l);
            }
        }
    }
}

fn prescribed_udot(state: &State, body: usize, method: MotionMethod) -> Vec<f64> {
    let range = state.layout[body].u_range();
    if method == MotionMethod::Prescribed {
        state.prescribed_udot[range].to_vec()
    } else {
        vec![0.0; range.len()]
    }
}
