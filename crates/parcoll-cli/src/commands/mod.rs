pub mod mandelbrot;
pub mod perf;
