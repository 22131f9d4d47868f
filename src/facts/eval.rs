use crate::Result;
use ohno::bail;

/// Operators in match order: two-character operators first so that `>=`
/// is not misread as `>`.
const OPERATORS: [&str; 6] = [">=", "<=", ">", "<", "==", "!="];

/// Evaluate a single comparison of the form `<number> <op> <number>`.
///
/// Operands are decimal floats; anything else is an error.
pub fn expression(expr: &str) -> Result<bool> {
    let expr = expr.trim();

    let Some(op) = OPERATORS.iter().find(|op| expr.contains(**op)) else {
        bail!("no valid operator found in expression '{expr}'");
    };

    let Some((left, right)) = expr.split_once(op) else {
        bail!("invalid expression format '{expr}'");
    };

    let left: f64 = match left.trim().parse() {
        Ok(v) => v,
        Err(e) => bail!("invalid left operand in '{expr}': {e}"),
    };

    let right: f64 = match right.trim().parse() {
        Ok(v) => v,
        Err(e) => bail!("invalid right operand in '{expr}': {e}"),
    };

    Ok(match *op {
        ">" => left > right,
        "<" => left < right,
        ">=" => left >= right,
        "<=" => left <= right,
        "==" => (left - right).abs() < f64::EPSILON,
        _ => (left - right).abs() >= f64::EPSILON,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater_than() {
        assert!(expression("3 > 2").unwrap());
        assert!(!expression("2 > 3").unwrap());
    }

    #[test]
    fn test_greater_or_equal_on_boundary() {
        assert!(expression("2.5 >= 2.5").unwrap());
    }

    #[test]
    fn test_equality_and_inequality() {
        assert!(expression("1.0 == 1").unwrap());
        assert!(expression("1.5 != 1").unwrap());
        assert!(!expression("1 != 1").unwrap());
    }

    #[test]
    fn test_less_than() {
        assert!(expression("0.1 < 0.2").unwrap());
        assert!(expression("0.1 <= 0.1").unwrap());
    }

    #[test]
    fn test_non_numeric_operand_is_an_error() {
        assert!(expression("a > 1").is_err());
    }

    #[test]
    fn test_missing_operator_is_an_error() {
        assert!(expression("3 2").is_err());
    }

    #[test]
    fn test_surrounding_whitespace_tolerated() {
        assert!(expression("  3>2  ").unwrap());
    }
}
