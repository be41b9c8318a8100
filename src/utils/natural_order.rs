use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// Compara identificadores de línea en orden "natural": los numéricos se
/// comparan por valor y van antes que los alfanuméricos.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (numeric_key(a), numeric_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_key(value: &str) -> Option<OrderedFloat<f64>> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
}
