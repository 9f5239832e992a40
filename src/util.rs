/*!

  Utils for testing sized netlists.

*/

/// Compare two size dumps line by line: names must match exactly and sizes within `tol`.
#[macro_export]
macro_rules! assert_sizes_eq {
    ($left:expr, $right:expr, $tol:expr $(,)?) => {
        match (&$left, &$right, $tol) {
            (left_val, right_val, tol) => {
                let left_lines: Vec<&str> = left_val.lines().collect();
                let right_lines: Vec<&str> = right_val.lines().collect();
                assert_eq!(left_lines.len(), right_lines.len(), "dumps differ in length");
                for (left_line, right_line) in left_lines.iter().zip(right_lines.iter()) {
                    let (left_name, left_size) = left_line
                        .trim()
                        .split_once(' ')
                        .expect("size dump line is missing a size");
                    let (right_name, right_size) = right_line
                        .trim()
                        .split_once(' ')
                        .expect("size dump line is missing a size");
                    assert_eq!(left_name, right_name);
                    let left_size: f64 = left_size.trim().parse().expect("size is not a number");
                    let right_size: f64 = right_size.trim().parse().expect("size is not a number");
                    assert!(
                        (left_size - right_size).abs() <= tol,
                        "size of {} differs: {} vs {}",
                        left_name,
                        left_size,
                        right_size
                    );
                }
            }
        }
    };
}
