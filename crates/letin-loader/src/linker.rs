//! Two-pass linking: compute each module's function/variable offset in the
//! combined address space, then rewrite every relocation so instructions
//! that referenced module-local indices now reference the linked ones, or
//! (for symbolic relocations) reference another module's exported symbol.

use crate::environment::Environment;
use crate::error::{LoaderError, ModuleError, Result};
use crate::format::{reloc_shift_arg, RawModule, RawReloc, RelocKind, Slot};
use letin_vm::{Arg, Function};
use rustc_hash::FxHashMap;
use tracing::debug;

pub fn link_modules(modules: Vec<RawModule>, native_symbols: &FxHashMap<String, u32>) -> Result<Environment> {
    let mut errors: Vec<ModuleError> = Vec::new();

    let mut fun_offsets = Vec::with_capacity(modules.len());
    let mut var_offsets = Vec::with_capacity(modules.len());
    let (mut fun_total, mut var_total) = (0u32, 0u32);
    for m in &modules {
        fun_offsets.push(fun_total);
        var_offsets.push(var_total);
        fun_total += m.functions.len() as u32;
        var_total += m.global_vars.len() as u32;
    }

    let mut fun_symbols = FxHashMap::default();
    let mut var_symbols = FxHashMap::default();

    for (mi, m) in modules.iter().enumerate() {
        for (name, local_index) in &m.fun_syms {
            let global_index = fun_offsets[mi] + local_index;
            if fun_symbols.insert(name.clone(), global_index).is_some() {
                errors.push(ModuleError { module: mi, error: LoaderError::FunSym(name.clone()) });
            }
        }
        for (name, local_index) in &m.var_syms {
            let global_index = var_offsets[mi] + local_index;
            if var_symbols.insert(name.clone(), global_index).is_some() {
                errors.push(ModuleError { module: mi, error: LoaderError::VarSym(name.clone()) });
            }
        }
    }

    let mut entry_fun_index = None;
    for (mi, m) in modules.iter().enumerate() {
        if let Some(name) = &m.entry_fun_sym {
            match fun_symbols.get(name) {
                Some(&index) => {
                    entry_fun_index.get_or_insert(index);
                }
                None => errors.push(ModuleError { module: mi, error: LoaderError::NoFunSym(name.clone()) }),
            }
        }
    }

    let mut functions: Vec<Function> = Vec::with_capacity(fun_total as usize);
    let mut global_vars = Vec::with_capacity(var_total as usize);

    for (mi, m) in modules.into_iter().enumerate() {
        // Only the first module a program loads is exempt from declaring
        // itself relocatable (§7); every later one lacking the flag fails
        // with NO_RELOC and has its relocations skipped entirely.
        let apply_relocs = mi == 0 || m.relocatable;
        if !apply_relocs {
            errors.push(ModuleError { module: mi, error: LoaderError::NoReloc });
        }

        let mut module_functions: Vec<Function> =
            m.functions.iter().map(|f| Function::new(f.arg_count, f.instrs.clone(), f.eval_strategy)).collect();

        if apply_relocs {
            for reloc in &m.relocs {
                if let Err(e) = apply_reloc(reloc, mi, &mut module_functions, &fun_offsets, &var_offsets, &fun_symbols, &var_symbols, native_symbols) {
                    errors.push(ModuleError { module: mi, error: e });
                }
            }
        }

        debug!(module = mi, functions = module_functions.len(), "linked module");
        functions.extend(module_functions);
        global_vars.extend(m.global_vars);
    }

    if !errors.is_empty() {
        return Err(LoaderError::Modules { errors });
    }

    Ok(Environment::new(functions, global_vars, fun_symbols, var_symbols, entry_fun_index))
}

#[allow(clippy::too_many_arguments)]
fn apply_reloc(
    reloc: &RawReloc,
    mi: usize,
    module_functions: &mut [Function],
    fun_offsets: &[u32],
    var_offsets: &[u32],
    fun_symbols: &FxHashMap<String, u32>,
    var_symbols: &FxHashMap<String, u32>,
    native_symbols: &FxHashMap<String, u32>,
) -> std::result::Result<(), LoaderError> {
    let reloc_err = || LoaderError::Reloc { module: mi, fun_index: reloc.fun_index, instr_index: reloc.instr_index };

    let fun = module_functions.get_mut(reloc.fun_index as usize).ok_or_else(reloc_err)?;
    let instr = fun.instrs.get_mut(reloc.instr_index as usize).ok_or_else(reloc_err)?;
    let current = match reloc.slot {
        Slot::Arg1 => instr.arg1,
        Slot::Arg2 => instr.arg2,
    };

    let new_arg = match &reloc.kind {
        RelocKind::GlobalVar => reloc_shift_arg(current, var_offsets[mi]),
        RelocKind::CallTarget => reloc_shift_arg(current, fun_offsets[mi]),
        RelocKind::SymFun(name) => {
            let index = *fun_symbols.get(name).ok_or_else(|| LoaderError::NoFunSym(name.clone()))?;
            Arg::Imm(index as i64)
        }
        RelocKind::SymVar(name) => {
            let index = *var_symbols.get(name).ok_or_else(|| LoaderError::NoVarSym(name.clone()))?;
            Arg::GlobalVar(index)
        }
        RelocKind::SymNativeFun(name) => {
            let index = *native_symbols.get(name).ok_or_else(|| LoaderError::NoNativeFunSym(name.clone()))?;
            Arg::Imm(index as i64)
        }
    };

    match reloc.slot {
        Slot::Arg1 => instr.arg1 = new_arg,
        Slot::Arg2 => instr.arg2 = new_arg,
    }
    Ok(())
}
