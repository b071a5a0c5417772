//! Pattern and text search operations.

use serde_json::{json, Map, Value};

use crate::analysis::{
    collector::SearchCollector,
    heuristics::is_compiler_generated,
    indices::build_module_index,
    pattern::PatternMatcher,
    search::{search_module, SearchKind},
    text::TermMatcher,
    usages,
};
use crate::metadata::{body::Operand, module::CilDef, token::Token};
use crate::rpc::dispatch::QueryContext;
use crate::rpc::handlers::{
    find_module, member_to_json, results_json, scope_modules, type_to_json,
};
use crate::rpc::params::{get_bool, max_results, opt_str, opt_u32, require_str};
use crate::{Error, Result};

fn compile_pattern(params: &Map<String, Value>) -> Result<PatternMatcher> {
    let pattern = require_str(params, "pattern")?;
    let case_sensitive = get_bool(params, "caseSensitive", false);
    let use_regex = get_bool(params, "useRegex", false);
    PatternMatcher::compile(&pattern, use_regex, case_sensitive)
}

/// `searchTypes` - type names matching a pattern across the workspace.
pub(crate) fn search_types(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let matcher = compile_pattern(params)?;
    let include_generated = get_bool(params, "searchCompilerGeneratedMembers", true);
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);

    'modules: for entry in &modules {
        for ty in entry.module.types() {
            if collector.truncated() {
                break 'modules;
            }
            if !include_generated && is_compiler_generated(&ty.name, &ty.attributes) {
                continue;
            }
            if !matcher.is_match(&ty.name) && !matcher.is_match(&ty.full_name) {
                continue;
            }
            collector.try_add(
                format!("type:{}:{:08X}", entry.mvid, ty.token.value()),
                json!({
                    "kind": "type",
                    "name": ty.name,
                    "fullName": ty.full_name,
                    "typeKind": ty.type_kind(),
                    "token": ty.token.value(),
                    "moduleMvid": entry.mvid,
                    "documentFilename": entry.filename(),
                }),
            );
        }
    }
    Ok(results_json(collector))
}

fn member_kind_allowed(requested: &str, candidate: &str) -> bool {
    requested == "any" || requested == candidate
}

/// `searchMembers` - member names matching a pattern, optionally restricted by
/// member kind.
pub(crate) fn search_members(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let matcher = compile_pattern(params)?;
    let include_generated = get_bool(params, "searchCompilerGeneratedMembers", true);
    let member_kind = opt_str(params, "memberKind")
        .unwrap_or_else(|| "any".to_string())
        .to_lowercase();
    if !matches!(
        member_kind.as_str(),
        "any" | "method" | "field" | "property" | "event"
    ) {
        return Err(Error::InvalidParameter(format!(
            "Unknown memberKind: {member_kind}"
        )));
    }
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);

    'modules: for entry in &modules {
        for ty in entry.module.types() {
            if collector.truncated() {
                break 'modules;
            }
            if !include_generated && is_compiler_generated(&ty.name, &ty.attributes) {
                continue;
            }

            macro_rules! scan_members {
                ($list:expr, $kind:literal) => {
                    if member_kind_allowed(&member_kind, $kind) {
                        for (_, member) in $list.iter() {
                            if collector.truncated() {
                                break;
                            }
                            if !include_generated
                                && is_compiler_generated(&member.name, &member.attributes)
                            {
                                continue;
                            }
                            if !matcher.is_match(&member.name)
                                && !matcher.is_match(&member.full_name)
                            {
                                continue;
                            }
                            collector.try_add(
                                format!("{}:{}:{:08X}", $kind, entry.mvid, member.token.value()),
                                json!({
                                    "kind": $kind,
                                    "name": member.name,
                                    "fullName": member.full_name,
                                    "token": member.token.value(),
                                    "declaringType": ty.full_name,
                                    "declaringTypeToken": ty.token.value(),
                                    "moduleMvid": entry.mvid,
                                    "documentFilename": entry.filename(),
                                }),
                            );
                        }
                    }
                };
            }

            scan_members!(ty.methods, "method");
            scan_members!(ty.fields, "field");
            scan_members!(ty.properties, "property");
            scan_members!(ty.events, "event");
        }
    }
    Ok(results_json(collector))
}

/// `searchStrings` - string literal operands matching a pattern.
pub(crate) fn search_strings(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let matcher = compile_pattern(params)?;
    let include_generated = get_bool(params, "searchCompilerGeneratedMembers", true);
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);

    'modules: for entry in &modules {
        for ty in entry.module.types() {
            if collector.truncated() {
                break 'modules;
            }
            if !include_generated && is_compiler_generated(&ty.name, &ty.attributes) {
                continue;
            }
            for (_, method) in ty.methods.iter() {
                if collector.truncated() {
                    break 'modules;
                }
                if !include_generated && is_compiler_generated(&method.name, &method.attributes) {
                    continue;
                }
                let Some(body) = &method.body else { continue };
                for instr in &body.instructions {
                    let Operand::String(text) = &instr.operand else {
                        continue;
                    };
                    if !matcher.is_match(text) {
                        continue;
                    }
                    if !collector.try_add(
                        format!(
                            "string:{}:{:08X}:{}",
                            entry.mvid,
                            method.token.value(),
                            instr.offset
                        ),
                        json!({
                            "kind": "string",
                            "value": text,
                            "methodToken": method.token.value(),
                            "methodFullName": method.full_name,
                            "declaringType": ty.full_name,
                            "declaringTypeToken": ty.token.value(),
                            "ilOffset": instr.offset,
                            "moduleMvid": entry.mvid,
                            "documentFilename": entry.filename(),
                        }),
                    ) {
                        break 'modules;
                    }
                }
            }
        }
    }
    Ok(results_json(collector))
}

/// `search` - the unified multi-kind text search.
pub(crate) fn search(ctx: &QueryContext<'_>, params: &Map<String, Value>) -> Result<Value> {
    let search_text = require_str(params, "searchText")?;
    let kind = SearchKind::parse(&opt_str(params, "searchType").unwrap_or_else(|| "any".into()))?;
    let location = opt_str(params, "searchLocation").unwrap_or_else(|| "allFiles".into());
    if !location.eq_ignore_ascii_case("allfiles") {
        return Err(Error::InvalidParameter(format!(
            "Unknown searchLocation: {location}"
        )));
    }
    let case_sensitive = get_bool(params, "caseSensitive", false);
    let whole_words = get_bool(params, "matchWholeWords", false);
    let match_any = get_bool(params, "matchAnySearchTerm", false);
    let search_decompiled = get_bool(params, "searchDecompiledData", true);
    let include_generated = get_bool(params, "searchCompilerGeneratedMembers", true);

    let matcher = TermMatcher::new(&search_text, case_sensitive, whole_words, match_any);
    let mut collector = SearchCollector::new(max_results(params));
    for entry in scope_modules(ctx, params) {
        if collector.truncated() {
            break;
        }
        search_module(
            &entry,
            kind,
            &matcher,
            search_decompiled,
            include_generated,
            &mut collector,
        );
    }
    Ok(results_json(collector))
}

/// `symbolResolve` - resolve a `(moduleMvid, token)` pair, or find all symbols
/// with an exact fully-qualified name.
pub(crate) fn symbol_resolve(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    if let Some(token) = opt_u32(params, "token")? {
        let module = find_module(ctx, params, "moduleMvid")?;
        let mvid = module.mvid_text();
        return match module
            .resolve_token(Token::new(token))
            .ok_or_else(|| invalid_param_error!("Member not found"))?
        {
            CilDef::Type(ty) => Ok(type_to_json(&ty)),
            CilDef::Method(m) => {
                Ok(member_to_json("method", &m.name, &m.full_name, m.token.value(), &mvid))
            }
            CilDef::Field(f) => {
                Ok(member_to_json("field", &f.name, &f.full_name, f.token.value(), &mvid))
            }
            CilDef::Property(p) => {
                Ok(member_to_json("property", &p.name, &p.full_name, p.token.value(), &mvid))
            }
            CilDef::Event(e) => {
                Ok(member_to_json("event", &e.name, &e.full_name, e.token.value(), &mvid))
            }
        };
    }

    let full_name = require_str(params, "fullName")?;
    let kind = opt_str(params, "kind")
        .unwrap_or_else(|| "any".to_string())
        .to_lowercase();
    let allow = |candidate: &str| kind == "any" || kind == candidate;
    let mut collector = SearchCollector::new(max_results(params));

    'modules: for entry in build_module_index(ctx.workspace) {
        for ty in entry.module.types() {
            if collector.truncated() {
                break 'modules;
            }
            if allow("type") && ty.full_name == full_name {
                let mut record = type_to_json(ty);
                record["documentFilename"] = json!(entry.filename());
                collector.try_add(
                    format!("type:{}:{:08X}", entry.mvid, ty.token.value()),
                    record,
                );
            }

            macro_rules! match_members {
                ($list:expr, $kind:literal, $tag:literal) => {
                    if allow($kind) {
                        for (_, member) in $list.iter() {
                            if member.full_name != full_name {
                                continue;
                            }
                            let mut record = member_to_json(
                                $kind,
                                &member.name,
                                &member.full_name,
                                member.token.value(),
                                &entry.mvid,
                            );
                            record["declaringType"] = json!(ty.full_name);
                            record["declaringTypeToken"] = json!(ty.token.value());
                            record["documentFilename"] = json!(entry.filename());
                            if !collector.try_add(
                                format!("{}:{}:{:08X}", $tag, entry.mvid, member.token.value()),
                                record,
                            ) {
                                break;
                            }
                        }
                    }
                };
            }

            match_members!(ty.methods, "method", "method");
            match_members!(ty.fields, "field", "field");
            match_members!(ty.properties, "property", "prop");
            match_members!(ty.events, "event", "event");
        }
    }
    Ok(results_json(collector))
}

/// `findAttributes` - attribute applications whose attribute type matches a
/// pattern.
pub(crate) fn find_attributes(
    ctx: &QueryContext<'_>,
    params: &Map<String, Value>,
) -> Result<Value> {
    let matcher = compile_pattern(params)?;
    let include_assembly_module = get_bool(params, "includeAssemblyModule", true);
    let include_parameters = get_bool(params, "includeParameters", false);
    let include_generated = get_bool(params, "searchCompilerGeneratedMembers", true);
    let mut collector = SearchCollector::new(max_results(params));
    let modules = scope_modules(ctx, params);

    usages::find_attributes(
        &modules,
        &matcher,
        include_assembly_module,
        include_parameters,
        include_generated,
        &mut collector,
    );
    Ok(results_json(collector))
}
