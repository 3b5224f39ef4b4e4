//! Exponential Moving Average kernel.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = v[i]*k + EMA[i-1]*(1-k).

/// EMA of `values`. Element `j` of the result belongs to input index
/// `j + period - 1`; nothing is returned for the warm-up.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out.push(ema);

    for &value in &values[period..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }

    out
}
