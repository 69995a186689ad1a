use std::fmt::Write;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tether::{FunctionHandle, Lua, ObjectHandle, RuntimeConfig, args};

fn build_script(statements: usize) -> String {
    let mut src = String::with_capacity(statements * 48);
    let _ = writeln!(src, "local acc = 0");
    for i in 0..statements {
        let _ = writeln!(src, "acc = acc + {} * ({} - 1)", i, i + 2);
    }
    let _ = writeln!(src, "return acc");
    src
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("lua/do_string");

    for statements in [10usize, 100, 1_000] {
        let source = build_script(statements);
        for cache_chunks in [true, false] {
            let lua = Lua::with_config(RuntimeConfig {
                cache_chunks,
                ..RuntimeConfig::default()
            })
            .unwrap();
            let label = if cache_chunks { "cached" } else { "uncached" };
            group.bench_with_input(
                BenchmarkId::new(label, statements),
                source.as_str(),
                |b, source| {
                    b.iter(|| {
                        let result = lua.do_string(black_box(source));
                        black_box(result.get_as::<i64>(1));
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_calls(c: &mut Criterion) {
    let lua = Lua::new();
    let add = FunctionHandle::from(&lua.eval("function(a, b, c) return a + b + c end"));
    let mut group = c.benchmark_group("function/call");

    group.bench_function("args_slice", |b| {
        b.iter(|| {
            let result = add.call(args![1, 2.5, black_box(3)]);
            black_box(result.get_as::<f64>(1));
        });
    });

    group.bench_function("builder", |b| {
        b.iter(|| {
            let mut call = add.builder();
            call.append(1).append(2.5).append(black_box(3));
            black_box(call.invoke().get_as::<f64>(1));
        });
    });

    group.finish();
}

fn bench_tables(c: &mut Criterion) {
    let lua = Lua::new();
    let table = lua.new_table();
    let mut group = c.benchmark_group("table/field");

    group.bench_function("set_get_string_key", |b| {
        b.iter(|| {
            table.set_field("counter", black_box(7)).unwrap();
            black_box(table.get_field("counter").get_as::<i64>(1));
        });
    });

    group.bench_function("set_get_integer_key", |b| {
        b.iter(|| {
            table.set_field(black_box(42), "value").unwrap();
            black_box(table.get_field(42).get_as::<String>(1));
        });
    });

    group.finish();
}

fn bench_promotion(c: &mut Criterion) {
    let lua = Lua::new();
    let mut group = c.benchmark_group("registry/promote");

    group.bench_function("from_result", |b| {
        let result = lua.eval("{}");
        b.iter(|| {
            let handle = ObjectHandle::from(&result);
            black_box(handle.is_nil());
        });
    });

    group.bench_function("clone", |b| {
        let handle = ObjectHandle::from(&lua.eval("{}"));
        b.iter(|| black_box(handle.clone()));
    });

    group.finish();
}

criterion_group!(benches, bench_eval, bench_calls, bench_tables, bench_promotion);
criterion_main!(benches);
