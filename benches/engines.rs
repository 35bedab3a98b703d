use cayley::element::Transf;
use cayley::froidure_pin::FroidurePin;
use cayley::knuth_bendix::KnuthBendix;
use cayley::presentation::Presentation;
use cayley::runner::Run;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

fn froidure_pin_t5(c: &mut Criterion) {
    c.bench_function("froidure_pin_t5", |b| {
        b.iter(|| {
            let mut fp = FroidurePin::new(vec![
                Transf::from([1, 0, 2, 3, 4]),
                Transf::from([1, 2, 3, 4, 0]),
                Transf::from([0, 0, 2, 3, 4]),
            ])
            .expect("valid generators");
            fp.size().expect("enumeration completes")
        })
    });
}

fn knuth_bendix_klein_four(c: &mut Criterion) {
    c.bench_function("knuth_bendix_klein_four", |b| {
        b.iter(|| {
            let mut p = Presentation::new(2);
            p.set_contains_empty_word(true);
            p.add_rule(vec![0, 0], vec![]).expect("valid rule");
            p.add_rule(vec![1, 1], vec![]).expect("valid rule");
            p.add_rule(vec![0, 1, 0, 1], vec![]).expect("valid rule");
            let mut kb = KnuthBendix::new(p).expect("valid presentation");
            kb.run().expect("completion terminates");
            kb.size().expect("size is countable")
        })
    });
}

criterion_group!(benches, froidure_pin_t5, knuth_bendix_klein_four);
criterion_main!(benches);
