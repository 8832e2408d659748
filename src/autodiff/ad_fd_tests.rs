//! Random expression trees checked against finite differences.
//!
//! Trees are generated from a seeded `StdRng` and built only from shapes that stay inside
//! the domain of every operation (denominators b^2 + 1, log(u^2 + 1), arcsin(0.5 tanh u), ...),
//! so every tree is defined and smooth around the sampled point.

#[cfg(test)]
mod tests {
    use crate::autodiff::ad_functions::ElementaryFunction;
    use crate::autodiff::ad_variable::Variable;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use strum::IntoEnumIterator;

    const NAMES: [&str; 3] = ["x", "y", "z"];

    #[derive(Debug, Clone)]
    enum Expr {
        Var(usize),
        Const(f64),
        Add(Box<Expr>, Box<Expr>),
        Sub(Box<Expr>, Box<Expr>),
        Mul(Box<Expr>, Box<Expr>),
        /// a / (b^2 + 1)
        Div(Box<Expr>, Box<Expr>),
        /// (a^2 + 1)^c
        PowConst(Box<Expr>, f64),
        /// (a^2 + 1)^tanh(b)
        PowNodes(Box<Expr>, Box<Expr>),
        /// c^tanh(a)
        RPow(f64, Box<Expr>),
        Func(ElementaryFunction, Box<Expr>),
    }

    fn random_expr(rng: &mut StdRng, depth: usize) -> Expr {
        if depth == 0 || rng.random_range(0..4) == 0 {
            return if rng.random_range(0..4) == 0 {
                Expr::Const(rng.random_range(0.5..1.5))
            } else {
                Expr::Var(rng.random_range(0..NAMES.len()))
            };
        }
        let sub = |rng: &mut StdRng| Box::new(random_expr(rng, depth - 1));
        match rng.random_range(0..9) {
            0 => Expr::Add(sub(rng), sub(rng)),
            1 => Expr::Sub(sub(rng), sub(rng)),
            2 => Expr::Mul(sub(rng), sub(rng)),
            3 => Expr::Div(sub(rng), sub(rng)),
            4 => {
                let c = rng.random_range(-1.5..1.5);
                Expr::PowConst(sub(rng), c)
            }
            5 => Expr::PowNodes(sub(rng), sub(rng)),
            6 => {
                let c = rng.random_range(0.5..3.0);
                Expr::RPow(c, sub(rng))
            }
            _ => {
                let functions: Vec<ElementaryFunction> = ElementaryFunction::iter().collect();
                let f = functions[rng.random_range(0..functions.len())];
                Expr::Func(f, sub(rng))
            }
        }
    }

    /// the function applied to an argument mapped into its domain
    fn safe_apply(f: ElementaryFunction, u: &Variable) -> Variable {
        let arg = match f {
            ElementaryFunction::Log => u * u + 1.0,
            ElementaryFunction::Arcsin | ElementaryFunction::Arccos | ElementaryFunction::Tan => {
                0.5 * u.tanh().unwrap()
            }
            ElementaryFunction::Exp | ElementaryFunction::Sinh | ElementaryFunction::Cosh => {
                u.tanh().unwrap()
            }
            _ => u.clone(),
        };
        f.apply(&arg).unwrap()
    }

    fn eval(expr: &Expr, vars: &[Variable]) -> Variable {
        match expr {
            Expr::Var(i) => vars[*i].clone(),
            Expr::Const(c) => Variable::constant(*c),
            Expr::Add(a, b) => eval(a, vars) + eval(b, vars),
            Expr::Sub(a, b) => eval(a, vars) - eval(b, vars),
            Expr::Mul(a, b) => eval(a, vars) * eval(b, vars),
            Expr::Div(a, b) => {
                let d = eval(b, vars);
                eval(a, vars) / (&d * &d + 1.0)
            }
            Expr::PowConst(a, c) => {
                let u = eval(a, vars);
                (&u * &u + 1.0).powf(*c).unwrap()
            }
            Expr::PowNodes(a, b) => {
                let u = eval(a, vars);
                let e = eval(b, vars).tanh().unwrap();
                (&u * &u + 1.0).pow(&e).unwrap()
            }
            Expr::RPow(c, a) => eval(a, vars).tanh().unwrap().rpow(*c).unwrap(),
            Expr::Func(f, a) => safe_apply(*f, &eval(a, vars)),
        }
    }

    fn variables(point: &[f64]) -> Vec<Variable> {
        NAMES
            .iter()
            .zip(point.iter())
            .map(|(name, v)| Variable::new(*v, name))
            .collect()
    }

    fn value_at(expr: &Expr, point: &[f64]) -> f64 {
        eval(expr, &variables(point)).value()[0]
    }

    fn shifted(point: &[f64], i: usize, h: f64) -> Vec<f64> {
        let mut p = point.to_vec();
        p[i] += h;
        p
    }

    fn close(ad: f64, fd: f64, tol: f64) -> bool {
        (ad - fd).abs() <= tol * fd.abs().max(1.0)
    }

    /// gradient by central differences of the value, Hessian by central differences of the
    /// AD gradient
    fn check_against_finite_differences(expr: &Expr, point: &[f64]) {
        let f = eval(expr, &variables(point));
        let h = 1e-5;
        for (i, xi) in NAMES.iter().enumerate() {
            let fd = (value_at(expr, &shifted(point, i, h)) - value_at(expr, &shifted(point, i, -h)))
                / (2.0 * h);
            let ad = f.partial(xi)[0];
            assert!(close(ad, fd, 1e-4), "{:?}\nd/d{}: ad {} fd {}", expr, xi, ad, fd);
        }
        for (j, xj) in NAMES.iter().enumerate() {
            let plus = eval(expr, &variables(&shifted(point, j, h)));
            let minus = eval(expr, &variables(&shifted(point, j, -h)));
            for xi in NAMES.iter() {
                let fd = (plus.partial(xi)[0] - minus.partial(xi)[0]) / (2.0 * h);
                let ad = f.partial2(xi, xj)[0];
                assert!(
                    close(ad, fd, 1e-3),
                    "{:?}\nd2/d{}d{}: ad {} fd {}",
                    expr,
                    xi,
                    xj,
                    ad,
                    fd
                );
                assert_eq!(f.partial2(xi, xj), f.partial2(xj, xi));
            }
        }
    }

    #[test]
    fn test_random_trees_against_finite_differences() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let expr = random_expr(&mut rng, 3);
            let point: Vec<f64> = (0..NAMES.len()).map(|_| rng.random_range(0.3..1.2)).collect();
            check_against_finite_differences(&expr, &point);
        }
    }

    #[test]
    fn test_every_elementary_function_against_finite_differences() {
        let arg = Expr::Mul(Box::new(Expr::Var(0)), Box::new(Expr::Var(1)));
        for f in ElementaryFunction::iter() {
            let expr = Expr::Add(
                Box::new(Expr::Func(f, Box::new(arg.clone()))),
                Box::new(Expr::Var(2)),
            );
            check_against_finite_differences(&expr, &[0.7, -0.4, 1.1]);
        }
    }

    #[test]
    fn test_vector_evaluation_matches_pointwise() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<Vec<f64>> = (0..4)
            .map(|_| (0..NAMES.len()).map(|_| rng.random_range(0.3..1.2)).collect())
            .collect();
        let vector_vars: Vec<Variable> = (0..NAMES.len())
            .map(|i| {
                let column: Vec<f64> = points.iter().map(|p| p[i]).collect();
                Variable::new(column, NAMES[i])
            })
            .collect();
        for _ in 0..20 {
            let expr = random_expr(&mut rng, 3);
            // a tree without variables stays a single point
            let batched = eval(&expr, &vector_vars).broadcast_to(points.len());
            for (k, point) in points.iter().enumerate() {
                let single = eval(&expr, &variables(point));
                assert!(close(batched.value()[k], single.value()[0], 1e-12));
                for x in NAMES {
                    assert!(close(batched.partial(x)[k], single.partial(x)[0], 1e-12));
                    for y in NAMES {
                        assert!(close(
                            batched.partial2(x, y)[k],
                            single.partial2(x, y)[0],
                            1e-12
                        ));
                    }
                }
            }
        }
    }
}
