use super::{FloatT, ScalarMath};

impl<T: FloatT> ScalarMath for T {
    type T = T;
    fn clip(&self, min_thresh: T, max_thresh: T, min_new: T, max_new: T) -> T {
        if *self < min_thresh {
            min_new
        } else if *self > max_thresh {
            max_new
        } else {
            *self
        }
    }

    fn project(&self, lo: T, hi: T) -> T {
        T::min(T::max(*self, lo), hi)
    }
}

#[test]
fn test_scalar_clip_and_project() {
    // values below the floor are reset to one, above the ceiling are capped
    assert_eq!((1e-6f64).clip(1e-4, 1e4, 1.0, 1e4), 1.0);
    assert_eq!((1e6f64).clip(1e-4, 1e4, 1.0, 1e4), 1e4);
    assert_eq!((3.0f64).clip(1e-4, 1e4, 1.0, 1e4), 3.0);

    assert_eq!((3.0f64).project(-1.0, 1.0), 1.0);
    assert_eq!((-3.0f64).project(-1.0, 1.0), -1.0);
    assert_eq!((0.5f64).project(-1.0, 1.0), 0.5);
}
