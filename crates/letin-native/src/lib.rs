//! The native-function bridge (§6): argument checkers/setters in the idiom
//! of the original's checker/converter/setter combinator templates, the
//! eight default native functions every environment carries, and the
//! (stubbed) native-library loading boundary.

mod checking;
mod defaults;
mod error;
mod library;
mod setting;
mod table;

pub use checking::{check_byte_string, check_float, check_int, check_object, check_ref, check_unique_object};
pub use error::{NativeError, Result as NativeResult};
pub use library::{register_library, NativeLibrary, NativeLibraryLoader, StaticLibraryLoader};
pub use setting::{set_byte_string, set_io, set_pair};
pub use table::NativeTable;

#[cfg(test)]
mod tests {
    use super::*;
    use letin_gc::{GarbageCollector, GcConfig};
    use letin_value::Value;
    use letin_vm::{NativeHook, ThreadContext};

    fn gc() -> GarbageCollector {
        GarbageCollector::new(GcConfig::default())
    }

    #[test]
    fn itoa_then_atoi_round_trips_an_integer() {
        let gc = gc();
        let table = NativeTable::new();
        let ctx = ThreadContext::new();
        let formatted = table.call_native(&gc, &ctx, 1, vec![Value::Int(-42)]).unwrap();
        let back = table.call_native(&gc, &ctx, 0, vec![formatted]).unwrap();
        assert_eq!(back, Value::Int(-42));
    }

    #[test]
    fn ftoa_then_atof_round_trips_a_float() {
        let gc = gc();
        let table = NativeTable::new();
        let ctx = ThreadContext::new();
        let formatted = table.call_native(&gc, &ctx, 3, vec![Value::Float(3.5)]).unwrap();
        let back = table.call_native(&gc, &ctx, 2, vec![formatted]).unwrap();
        assert_eq!(back, Value::Float(3.5));
    }

    #[test]
    fn put_char_threads_the_same_io_token_back() {
        let gc = gc();
        let table = NativeTable::new();
        let ctx = ThreadContext::new();
        let io = set_io(&gc);
        let r = io.as_ref().unwrap();
        let result = table.call_native(&gc, &ctx, 5, vec![io, Value::Int(b'x' as i64)]).unwrap();
        assert_eq!(result, Value::Ref(r));
    }

    #[test]
    fn put_char_rejects_a_non_ref_argument() {
        let gc = gc();
        let table = NativeTable::new();
        let ctx = ThreadContext::new();
        let err = table.call_native(&gc, &ctx, 5, vec![Value::Int(0), Value::Int(b'x' as i64)]).unwrap_err();
        assert_eq!(err.error, letin_vm::RuntimeError::IncorrectValue);
    }

    #[test]
    fn unknown_native_index_errors_no_native_fun() {
        let gc = gc();
        let table = NativeTable::new();
        let ctx = ThreadContext::new();
        let err = table.call_native(&gc, &ctx, 999, vec![]).unwrap_err();
        assert_eq!(err.error, letin_vm::RuntimeError::NoNativeFun);
    }

    #[test]
    fn registering_below_the_unreserved_threshold_is_refused() {
        let mut table = NativeTable::new();
        let result = table.register(10, |_gc, _args| Ok(Value::Int(0)));
        assert_eq!(result, Err(10));
    }

    #[test]
    fn registered_library_function_is_reachable_by_its_assigned_index() {
        struct Double;
        impl NativeLibrary for Double {
            fn functions(
                &self,
            ) -> Vec<(
                String,
                Box<dyn Fn(&GarbageCollector, Vec<Value>) -> letin_vm::Result<Value> + Send + Sync>,
            )> {
                vec![(
                    "double".to_string(),
                    Box::new(|_gc, args: Vec<Value>| {
                        let n = args[0].as_int().map_err(|_| {
                            letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectValue)
                        })?;
                        Ok(Value::Int(n * 2))
                    }),
                )]
            }
        }

        let mut table = NativeTable::new();
        let symbols = register_library(&mut table, &Double, 1024);
        assert_eq!(symbols.get("double"), Some(&1024));

        let gc = gc();
        let ctx = ThreadContext::new();
        let result = table.call_native(&gc, &ctx, 1024, vec![Value::Int(21)]).unwrap();
        assert_eq!(result, Value::Int(42));
    }
}
