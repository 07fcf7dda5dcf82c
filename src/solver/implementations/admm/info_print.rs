use super::*;
use crate::algebra::*;
use crate::solver::core::{QpInfo, QpSettings};
use std::io::Write;
use std::time::Duration;

macro_rules! expformat {
    ($fmt:expr,$val:expr) => {
        if $val.is_finite() {
            _exp_str_reformat(format!($fmt, $val))
        } else {
            format!($fmt, $val)
        }
    };
}

const RULE: &str = "-----------------------------------------------------------------";

pub(crate) fn print_banner(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "       qpsession v{}  -  ADMM quadratic program solver",
        crate::version()
    )?;
    writeln!(out, "{RULE}")?;
    std::io::Result::Ok(())
}

pub(crate) fn print_configuration<T: FloatT>(
    out: &mut dyn Write,
    data: &AdmmProblemData<T>,
    settings: &QpSettings<T>,
) -> std::io::Result<()> {
    writeln!(out, "problem:")?;
    writeln!(out, "  variables     = {}", data.n)?;
    writeln!(out, "  constraints   = {}", data.m)?;
    writeln!(out, "  nnz(P)        = {}", data.P.nnz())?;
    writeln!(out, "  nnz(A)        = {}", data.A.nnz())?;
    writeln!(out)?;

    print_settings(out, settings)?;
    std::io::Result::Ok(())
}

fn print_settings<T: FloatT>(out: &mut dyn Write, set: &QpSettings<T>) -> std::io::Result<()> {
    writeln!(out, "settings:")?;

    writeln!(
        out,
        "  linear system: {}, precision: {} bit",
        set.linsys_solver,
        _get_precision_string::<T>()
    )?;

    let time_lim_str = {
        if set.time_limit == 0.0 {
            "off".to_string()
        } else if set.time_limit.is_infinite() {
            "Inf".to_string()
        } else {
            format!("{:?}", Duration::from_secs_f64(set.time_limit))
        }
    };
    writeln!(
        out,
        "  max iter = {}, time limit = {}, check termination = {}",
        set.max_iter,
        time_lim_str,
        match set.check_termination {
            0 => "off".to_string(),
            k => format!("every {k}"),
        }
    )?;

    writeln!(
        out,
        "  eps_abs = {:.1e}, eps_rel = {:.1e},",
        set.eps_abs, set.eps_rel
    )?;
    writeln!(
        out,
        "  eps_prim_inf = {:.1e}, eps_dual_inf = {:.1e},",
        set.eps_prim_inf, set.eps_dual_inf
    )?;

    writeln!(
        out,
        "  rho = {:.2e} (adaptive: {}), sigma = {:.2e}, alpha = {:.2}",
        set.rho,
        _bool_on_off(set.adaptive_rho),
        set.sigma,
        set.alpha
    )?;

    writeln!(
        out,
        "  scaling: {} ({} iter), scaled termination: {}",
        _bool_on_off(set.scaling > 0),
        set.scaling,
        _bool_on_off(set.scaled_termination)
    )?;

    writeln!(
        out,
        "  warm start: {}, polish: {}",
        _bool_on_off(set.warm_start),
        _bool_on_off(set.polish)
    )?;

    writeln!(out)?;
    std::io::Result::Ok(())
}

pub(crate) fn print_status_header(out: &mut dyn Write) -> std::io::Result<()> {
    //print a subheader for the iterations info
    write!(out, "iter   ")?;
    write!(out, "objective    ")?;
    write!(out, "pri res    ")?;
    write!(out, "dua res    ")?;
    write!(out, "rho        ")?;
    write!(out, "time")?;
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    out.flush()?;
    std::io::Result::Ok(())
}

pub(crate) fn print_status<T: FloatT>(
    out: &mut dyn Write,
    iter: u32,
    obj_val: T,
    pri_res: T,
    dua_res: T,
    rho: T,
    time: Duration,
) -> std::io::Result<()> {
    write!(out, "{:>4}  ", iter)?;
    write!(out, "{}  ", expformat!("{:+.4e}", obj_val))?;
    write!(out, "{}  ", expformat!("{:.2e}", pri_res))?;
    write!(out, "{}  ", expformat!("{:.2e}", dua_res))?;
    write!(out, "{}  ", expformat!("{:.2e}", rho))?;
    write!(out, "{:.2?}", time)?;
    writeln!(out)?;
    std::io::Result::Ok(())
}

pub(crate) fn print_polish<T: FloatT>(out: &mut dyn Write, info: &QpInfo<T>) -> std::io::Result<()> {
    write!(out, "plsh  ")?;
    write!(out, "{}  ", expformat!("{:+.4e}", info.obj_val))?;
    write!(out, "{}  ", expformat!("{:.2e}", info.pri_res))?;
    write!(out, "{}  ", expformat!("{:.2e}", info.dua_res))?;
    write!(out, " --------  ")?;
    writeln!(out, "({})", info.status_polish)?;
    std::io::Result::Ok(())
}

pub(crate) fn print_footer<T: FloatT>(out: &mut dyn Write, info: &QpInfo<T>) -> std::io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "status:               {}", info.status)?;
    writeln!(out, "number of iterations: {}", info.iter)?;
    if info.status.is_solved() {
        writeln!(
            out,
            "optimal objective:    {}",
            expformat!("{:.4e}", info.obj_val)
        )?;
    }
    if let Some(ref timing) = info.timing {
        writeln!(
            out,
            "run time:             {:?}",
            Duration::from_secs_f64(timing.run_time)
        )?;
    }
    writeln!(out, "optimal rho estimate: {}", expformat!("{:.2e}", info.rho_estimate))?;
    writeln!(out)?;
    out.flush()?;
    std::io::Result::Ok(())
}

fn _bool_on_off(v: bool) -> &'static str {
    match v {
        true => "on",
        false => "off",
    }
}

fn _get_precision_string<T: FloatT>() -> String {
    (::std::mem::size_of::<T>() * 8).to_string()
}

// convert a string in LowerExp display format into one that
// 1) always has a sign after the exponent, and
// 2) has at least two digits in the exponent.

fn _exp_str_reformat(mut thestr: String) -> String {
    let Some(eidx) = thestr.find('e') else {
        return thestr;
    };
    let has_sign = thestr[eidx + 1..].starts_with('-');

    let has_short_exp = {
        if !has_sign {
            thestr.len() == eidx + 2
        } else {
            thestr.len() == eidx + 3
        }
    };

    let chars = match (has_sign, has_short_exp) {
        (false, true) => "+0",
        (false, false) => "+",
        (true, true) => "0",
        (true, false) => "",
    };

    let shift = if has_sign { 2 } else { 1 };
    thestr.insert_str(eidx + shift, chars);
    thestr
}

#[test]
fn test_exp_str_reformat() {
    assert_eq!(_exp_str_reformat("1.00e1".to_string()), "1.00e+01");
    assert_eq!(_exp_str_reformat("1.00e-1".to_string()), "1.00e-01");
    assert_eq!(_exp_str_reformat("1.00e-10".to_string()), "1.00e-10");
    assert_eq!(_exp_str_reformat("1.00e10".to_string()), "1.00e+10");
    assert_eq!(_exp_str_reformat("inf".to_string()), "inf");
}

#[test]
fn test_print_status_line() {
    let mut buf = Vec::<u8>::new();
    print_status(&mut buf, 25, 1.5f64, 1e-4, 2e-3, 0.1, Duration::from_millis(3)).unwrap();
    let line = String::from_utf8(buf).unwrap();
    assert!(line.starts_with("  25  +1.5000e+00  1.00e-04  2.00e-03  1.00e-01"));
}
