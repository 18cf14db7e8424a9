//! Stacked LSTM with a linear read-out, forward and backward passes.
//!
//! Gate layout inside each `4H` block is `[input, forget, candidate, output]`.
//! Gates use the logistic sigmoid; the candidate and the cell output use ReLU.
//! Dropout follows every recurrent layer; only the last time step of the top
//! layer reaches the read-out.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

/// One recurrent layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmLayer {
    /// Input weights, `4H x n_in`.
    w: DMatrix<f64>,
    /// Recurrent weights, `4H x H`.
    u: DMatrix<f64>,
    /// Gate biases, `4H`.
    b: DVector<f64>,
    hidden: usize,
}

/// Per-step values kept for backpropagation through time.
#[derive(Debug, Clone)]
struct StepCache {
    x: DVector<f64>,
    h_prev: DVector<f64>,
    c_prev: DVector<f64>,
    i: DVector<f64>,
    f: DVector<f64>,
    g: DVector<f64>,
    o: DVector<f64>,
    c: DVector<f64>,
}

/// Inverted-dropout multipliers, indexed `[layer][time]`.
pub type DropoutMasks = Vec<Vec<DVector<f64>>>;

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn relu(v: f64) -> f64 {
    v.max(0.0)
}

fn relu_grad(v: f64) -> f64 {
    if v > 0.0 { 1.0 } else { 0.0 }
}

fn glorot(
    rng: &mut StdRng,
    rows: usize,
    cols: usize,
    fan_in: usize,
    fan_out: usize,
) -> DMatrix<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    DMatrix::from_fn(rows, cols, |_, _| rng.sample(dist))
}

impl LstmLayer {
    fn new(n_in: usize, hidden: usize, rng: &mut StdRng) -> Self {
        let w = glorot(rng, 4 * hidden, n_in, n_in, 4 * hidden);
        let u = glorot(rng, 4 * hidden, hidden, hidden, 4 * hidden);
        let mut b = DVector::<f64>::zeros(4 * hidden);
        b.rows_mut(hidden, hidden).fill(1.0);
        Self { w, u, b, hidden }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w: DMatrix::zeros(self.w.nrows(), self.w.ncols()),
            u: DMatrix::zeros(self.u.nrows(), self.u.ncols()),
            b: DVector::zeros(self.b.len()),
            hidden: self.hidden,
        }
    }

    /// Run the layer over a whole sequence from zero state.
    fn forward(&self, inputs: &[DVector<f64>]) -> Vec<StepCache> {
        let hsz = self.hidden;
        let mut h = DVector::<f64>::zeros(hsz);
        let mut c = DVector::<f64>::zeros(hsz);
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let mut a = self.b.clone();
            a.gemv(1.0, &self.w, x, 1.0);
            a.gemv(1.0, &self.u, &h, 1.0);

            let i = a.rows(0, hsz).map(sigmoid);
            let f = a.rows(hsz, hsz).map(sigmoid);
            let g = a.rows(2 * hsz, hsz).map(relu);
            let o = a.rows(3 * hsz, hsz).map(sigmoid);

            let c_next = f.component_mul(&c) + i.component_mul(&g);
            let h_next = o.component_mul(&c_next.map(relu));

            steps.push(StepCache {
                x: x.clone(),
                h_prev: std::mem::replace(&mut h, h_next),
                c_prev: std::mem::replace(&mut c, c_next.clone()),
                i,
                f,
                g,
                o,
                c: c_next,
            });
        }

        steps
    }

    /// Backpropagate through time.
    ///
    /// `dh_out[t]` is the loss gradient on this layer's output at `t`. Parameter
    /// gradients are added into `grad`; the gradient w.r.t. each input is returned.
    fn backward(
        &self,
        steps: &[StepCache],
        dh_out: &[DVector<f64>],
        grad: &mut LstmLayer,
    ) -> Vec<DVector<f64>> {
        let hsz = self.hidden;
        let mut dh_next = DVector::<f64>::zeros(hsz);
        let mut dc_next = DVector::<f64>::zeros(hsz);
        let mut dx = vec![DVector::zeros(self.w.ncols()); steps.len()];
        let mut da = DVector::<f64>::zeros(4 * hsz);

        for t in (0..steps.len()).rev() {
            let s = &steps[t];
            let dh = &dh_out[t] + &dh_next;

            let d_o = dh.component_mul(&s.c.map(relu));
            let dc = dh.component_mul(&s.o).component_mul(&s.c.map(relu_grad)) + &dc_next;
            let d_f = dc.component_mul(&s.c_prev);
            let d_i = dc.component_mul(&s.g);
            let d_g = dc.component_mul(&s.i);
            dc_next = dc.component_mul(&s.f);

            da.rows_mut(0, hsz)
                .copy_from(&d_i.component_mul(&s.i.map(|v| v * (1.0 - v))));
            da.rows_mut(hsz, hsz)
                .copy_from(&d_f.component_mul(&s.f.map(|v| v * (1.0 - v))));
            da.rows_mut(2 * hsz, hsz)
                .copy_from(&d_g.component_mul(&s.g.map(relu_grad)));
            da.rows_mut(3 * hsz, hsz)
                .copy_from(&d_o.component_mul(&s.o.map(|v| v * (1.0 - v))));

            grad.w.ger(1.0, &da, &s.x, 1.0);
            grad.u.ger(1.0, &da, &s.h_prev, 1.0);
            grad.b += &da;

            dx[t] = self.w.tr_mul(&da);
            dh_next = self.u.tr_mul(&da);
        }

        dx
    }
}

/// Stacked LSTM regressor for univariate sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmNetwork {
    layers: Vec<LstmLayer>,
    w_out: DVector<f64>,
    b_out: DVector<f64>,
}

/// Forward-pass record for one training sample.
struct Trace {
    steps: Vec<Vec<StepCache>>,
    /// Top-layer output at the last step, after dropout.
    features: DVector<f64>,
}

impl LstmNetwork {
    /// Build a network with the given layer widths and a scalar input per step.
    pub fn new(widths: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(widths.len());
        let mut n_in = 1;
        for &width in widths {
            layers.push(LstmLayer::new(n_in, width, &mut rng));
            n_in = width;
        }
        let w_out = glorot(&mut rng, n_in, 1, n_in, 1).column(0).into_owned();
        Self {
            layers,
            w_out,
            b_out: DVector::zeros(1),
        }
    }

    /// Same shape with every parameter zero; used as a gradient accumulator.
    pub fn zeros_like(&self) -> Self {
        Self {
            layers: self.layers.iter().map(LstmLayer::zeros_like).collect(),
            w_out: DVector::zeros(self.w_out.len()),
            b_out: DVector::zeros(1),
        }
    }

    /// Parameter blocks in a fixed order.
    pub fn params(&self) -> Vec<&[f64]> {
        let mut out: Vec<&[f64]> = Vec::with_capacity(self.layers.len() * 3 + 2);
        for layer in &self.layers {
            out.push(layer.w.as_slice());
            out.push(layer.u.as_slice());
            out.push(layer.b.as_slice());
        }
        out.push(self.w_out.as_slice());
        out.push(self.b_out.as_slice());
        out
    }

    /// Mutable parameter blocks in the same order as [`LstmNetwork::params`].
    pub fn params_mut(&mut self) -> Vec<&mut [f64]> {
        let mut out: Vec<&mut [f64]> = Vec::with_capacity(self.layers.len() * 3 + 2);
        for layer in self.layers.iter_mut() {
            let LstmLayer { w, u, b, .. } = layer;
            out.push(w.as_mut_slice());
            out.push(u.as_mut_slice());
            out.push(b.as_mut_slice());
        }
        out.push(self.w_out.as_mut_slice());
        out.push(self.b_out.as_mut_slice());
        out
    }

    /// Element-wise `self += other`; shapes must match.
    pub fn accumulate(&mut self, other: &LstmNetwork) {
        for (dst, src) in self.params_mut().into_iter().zip(other.params()) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
    }

    /// Draw inverted-dropout masks for one sample of length `steps`.
    pub fn sample_masks(&self, rate: f64, steps: usize, rng: &mut StdRng) -> DropoutMasks {
        let keep_scale = 1.0 / (1.0 - rate);
        self.layers
            .iter()
            .map(|layer| {
                (0..steps)
                    .map(|_| {
                        DVector::from_fn(layer.hidden, |_, _| {
                            if rng.gen_bool(rate) { 0.0 } else { keep_scale }
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Inference: predict the value following `window`.
    pub fn predict(&self, window: &[f64]) -> f64 {
        let (y, _) = self.forward(window, None);
        y
    }

    fn forward(&self, window: &[f64], masks: Option<&DropoutMasks>) -> (f64, Trace) {
        let mut inputs: Vec<DVector<f64>> =
            window.iter().map(|&v| DVector::from_element(1, v)).collect();
        let mut steps = Vec::with_capacity(self.layers.len());

        for (l, layer) in self.layers.iter().enumerate() {
            let cache = layer.forward(&inputs);
            inputs = cache
                .iter()
                .enumerate()
                .map(|(t, s)| {
                    let h = s.o.component_mul(&s.c.map(relu));
                    match masks {
                        Some(m) => h.component_mul(&m[l][t]),
                        None => h,
                    }
                })
                .collect();
            steps.push(cache);
        }

        let features = inputs.pop().unwrap_or_else(|| DVector::zeros(self.w_out.len()));
        let y = self.w_out.dot(&features) + self.b_out[0];
        (y, Trace { steps, features })
    }

    /// Squared error of one sample and its parameter gradient.
    ///
    /// The gradient is scaled by `scale` (typically `1 / batch_size`) so summing
    /// per-sample gradients yields the batch-mean gradient.
    pub fn sample_gradient(
        &self,
        window: &[f64],
        target: f64,
        masks: Option<&DropoutMasks>,
        scale: f64,
    ) -> (f64, LstmNetwork) {
        let (y, trace) = self.forward(window, masks);
        let err = y - target;
        let dy = 2.0 * err * scale;

        let mut grad = self.zeros_like();
        grad.w_out.axpy(dy, &trace.features, 1.0);
        grad.b_out[0] += dy;

        let top = self.layers.len() - 1;
        let steps = window.len();

        // Only the last top-layer output feeds the read-out.
        let mut dh: Vec<DVector<f64>> = vec![DVector::zeros(self.layers[top].hidden); steps];
        let mut d_last = &self.w_out * dy;
        if let Some(m) = masks {
            d_last.component_mul_assign(&m[top][steps - 1]);
        }
        dh[steps - 1] = d_last;

        for l in (0..self.layers.len()).rev() {
            let dx = self.layers[l].backward(&trace.steps[l], &dh, &mut grad.layers[l]);
            if l == 0 {
                break;
            }
            dh = dx
                .into_iter()
                .enumerate()
                .map(|(t, d)| match masks {
                    Some(m) => d.component_mul(&m[l - 1][t]),
                    None => d,
                })
                .collect();
        }

        (err * err, grad)
    }
}
