//! Host helpers available to route scripts.
//!
//! - `int x`: integer coercion of a number, numeric string, or boolean.
//! - `uuid`: random v4 UUID.
//! - `uuid x`: name-based v3 UUID in the OID namespace, stable for `x`.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
};
use serde_json::Value;
use uuid::Uuid;

pub fn register(registry: &mut Handlebars<'static>) {
    registry.register_helper("int", Box::new(int_helper));
    registry.register_helper("uuid", Box::new(uuid_helper));
}

fn int_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("int", 0))?;
    let value = to_integer(param.value()).ok_or_else(|| {
        RenderErrorReason::Other(format!("cannot convert {} to an integer", param.value()))
    })?;
    out.write(&value.to_string())?;
    Ok(())
}

fn uuid_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let id = match h.param(0).map(|p| p.value()) {
        None => Uuid::new_v4(),
        Some(Value::String(name)) => Uuid::new_v3(&Uuid::NAMESPACE_OID, name.as_bytes()),
        Some(other) => Uuid::new_v3(&Uuid::NAMESPACE_OID, other.to_string().as_bytes()),
    };
    out.write(&id.to_string())?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn to_integer(value: &Value) -> Option<i64> {
    let truncate = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{RenderContext, RenderError, ScriptEngine};
    use super::*;

    fn render(source: &str, id: &str) -> Result<String, RenderError> {
        let mut engine = ScriptEngine::new();
        engine.register("t", source).unwrap();
        let mut ctx = RenderContext::new();
        ctx.insert("id", id);
        engine
            .render("t", &ctx)
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
    }

    #[test]
    fn int_coerces_numeric_strings() {
        assert_eq!(render("{{int id}}", "42").unwrap(), "42");
        assert_eq!(render("{{int id}}", " 7.9 ").unwrap(), "7");
    }

    #[test]
    fn int_rejects_non_numbers() {
        assert!(matches!(
            render("{{int id}}", "abc"),
            Err(RenderError::Script(_))
        ));
    }

    #[test]
    fn uuid_is_deterministic_for_an_input() {
        let first = render(r#""{{uuid id}}""#, "order-1").unwrap();
        let second = render(r#""{{uuid id}}""#, "order-1").unwrap();
        let other = render(r#""{{uuid id}}""#, "order-2").unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);

        let expected = Uuid::new_v3(&Uuid::NAMESPACE_OID, b"order-1");
        assert_eq!(first, format!("\"{expected}\""));
    }

    #[test]
    fn uuid_without_input_is_random_v4() {
        let first = render(r#""{{uuid}}""#, "x").unwrap();
        let second = render(r#""{{uuid}}""#, "x").unwrap();
        assert_ne!(first, second);
        let parsed = Uuid::parse_str(first.trim_matches('"')).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn to_integer_handles_json_values() {
        assert_eq!(to_integer(&serde_json::json!(3)), Some(3));
        assert_eq!(to_integer(&serde_json::json!(-2.5)), Some(-2));
        assert_eq!(to_integer(&serde_json::json!(true)), Some(1));
        assert_eq!(to_integer(&serde_json::json!(null)), None);
        assert_eq!(to_integer(&serde_json::json!("1e3")), Some(1000));
    }
}
