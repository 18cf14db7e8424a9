//! Adam optimiser over the network's flat parameter blocks.

use crate::models::lstm::network::LstmNetwork;

#[derive(Debug, Clone)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    m: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
}

impl Adam {
    pub fn new(net: &LstmNetwork, lr: f64) -> Self {
        let zeros: Vec<Vec<f64>> = net.params().iter().map(|p| vec![0.0; p.len()]).collect();
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            t: 0,
            m: zeros.clone(),
            v: zeros,
        }
    }

    /// Apply one update using the batch-mean gradient `grad`.
    pub fn step(&mut self, net: &mut LstmNetwork, grad: &LstmNetwork) {
        self.t += 1;
        let lr_t =
            self.lr * (1.0 - self.beta2.powi(self.t)).sqrt() / (1.0 - self.beta1.powi(self.t));

        for (((params, grads), m), v) in net
            .params_mut()
            .into_iter()
            .zip(grad.params())
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            for k in 0..params.len() {
                let g = grads[k];
                m[k] = self.beta1 * m[k] + (1.0 - self.beta1) * g;
                v[k] = self.beta2 * v[k] + (1.0 - self.beta2) * g * g;
                params[k] -= lr_t * m[k] / (v[k].sqrt() + self.eps);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_each_parameter_by_about_lr() {
        let mut net = LstmNetwork::new(&[3], 1);
        let before = net.clone();
        let (_, grad) = net.sample_gradient(&[0.2, 0.5, 0.9], 10.0, None, 1.0);

        let mut adam = Adam::new(&net, 0.01);
        adam.step(&mut net, &grad);
        assert_eq!(adam.t, 1);

        for ((after, orig), g) in net.params().iter().zip(before.params()).zip(grad.params()) {
            for k in 0..after.len() {
                let delta = orig[k] - after[k];
                if g[k].abs() > 1e-3 {
                    // Bias-corrected first step is lr * sign(g).
                    assert!(
                        (delta - 0.01 * g[k].signum()).abs() < 1e-4,
                        "delta {delta} g {}",
                        g[k]
                    );
                }
            }
        }
    }

    #[test]
    fn repeated_steps_reduce_loss() {
        let mut net = LstmNetwork::new(&[4], 2);
        let window = [0.1, 0.3, 0.5, 0.7];
        let target = 0.9;
        let mut adam = Adam::new(&net, 0.01);
        let (initial, _) = net.sample_gradient(&window, target, None, 1.0);
        for _ in 0..200 {
            let (_, grad) = net.sample_gradient(&window, target, None, 1.0);
            adam.step(&mut net, &grad);
        }
        let (last, _) = net.sample_gradient(&window, target, None, 1.0);
        assert!(last < initial * 0.1, "initial {initial} last {last}");
    }
}
