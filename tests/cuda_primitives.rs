//! Hardware probes against the host reference.
//!
//! Each test returns early when no CUDA device can be opened.

#[cfg(feature = "cuda")]
mod cuda_primitives_tests {
    use half::f16;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use tcgs_primitives::{
        CpuBackend, CudaBackend, FragmentA, FragmentB, FragmentC, LoadWidth, Matrix16x8,
        Matrix8x8, PrimitiveBackend, EX2_F16_MAX_REL_ERR, EX2_ZERO_BELOW, LG2_F32_MAX_ABS_ERR,
    };

    fn cuda_or_skip() -> Option<CudaBackend> {
        let _ = env_logger::builder().is_test(true).try_init();
        match CudaBackend::new(0) {
            Ok(backend) => Some(backend),
            Err(err) => {
                eprintln!("skipping: no CUDA device ({err})");
                None
            }
        }
    }

    #[test]
    fn test_cuda_pack_matches_cpu() {
        let Some(cuda) = cuda_or_skip() else { return };
        let cpu = CpuBackend::new();

        let mut rng = StdRng::seed_from_u64(11);
        let mut xs: Vec<f32> = (0..4096).map(|_| rng.gen_range(-70000.0f32..70000.0)).collect();
        let mut ys: Vec<f32> = (0..4096).map(|_| rng.gen_range(-2.0f32..2.0)).collect();
        xs.extend([f32::INFINITY, f32::NEG_INFINITY, 65519.0, -0.0]);
        ys.extend([0.5, 65520.0, 1.0e-9, f32::MIN_POSITIVE]);

        assert_eq!(
            cuda.pack_f32x2(&xs, &ys).unwrap(),
            cpu.pack_f32x2(&xs, &ys).unwrap()
        );
    }

    #[test]
    fn test_cuda_ex2_within_documented_error() {
        let Some(cuda) = cuda_or_skip() else { return };

        let xs: Vec<f16> = (0..=u16::MAX)
            .map(f16::from_bits)
            .filter(|x| !x.is_nan())
            .collect();
        let gpu = cuda.ex2_f16(&xs).unwrap();

        for (x, g) in xs.iter().zip(&gpu) {
            let xf = x.to_f32().clamp(-10.0, 10.0);
            if xf < EX2_ZERO_BELOW {
                assert_eq!(g.to_bits(), 0, "ex2({x})");
                continue;
            }
            let exact = (xf as f64).exp2().min(1.0);
            let err = (g.to_f64() - exact).abs();
            assert!(
                err <= EX2_F16_MAX_REL_ERR as f64 * exact,
                "ex2({x}): gpu {g}, exact {exact}"
            );
        }
    }

    #[test]
    fn test_cuda_lg2_within_documented_error() {
        let Some(cuda) = cuda_or_skip() else { return };
        let cpu = CpuBackend::new();

        let mut rng = StdRng::seed_from_u64(23);
        let xs: Vec<f32> = (0..8192).map(|_| rng.gen_range(0.5f32..2.0)).collect();
        let gpu = cuda.lg2_f32(&xs).unwrap();
        let host = cpu.lg2_f32(&xs).unwrap();
        for ((x, g), h) in xs.iter().zip(&gpu).zip(&host) {
            assert!((g - h).abs() <= LG2_F32_MAX_ABS_ERR, "lg2({x}): gpu {g}, reference {h}");
        }
    }

    #[test]
    fn test_cuda_fma_matches_cpu_bitwise() {
        let Some(cuda) = cuda_or_skip() else { return };
        let cpu = CpuBackend::new();

        let mut rng = StdRng::seed_from_u64(37);
        let mut finite_pair = || {
            let lo = f16::from_f32(rng.gen_range(-300.0f32..300.0)).to_bits() as u32;
            let hi = f16::from_f32(rng.gen_range(-1.0f32..1.0)).to_bits() as u32;
            lo | (hi << 16)
        };
        let a: Vec<u32> = (0..4096).map(|_| finite_pair()).collect();
        let b: Vec<u32> = (0..4096).map(|_| finite_pair()).collect();
        let c: Vec<u32> = (0..4096).map(|_| finite_pair()).collect();

        assert_eq!(
            cuda.fma_f16x2(&a, &b, &c).unwrap(),
            cpu.fma_f16x2(&a, &b, &c).unwrap()
        );
    }

    #[test]
    fn test_cuda_ldmatrix_matches_cpu() {
        let Some(cuda) = cuda_or_skip() else { return };
        let cpu = CpuBackend::new();

        let tiles: Vec<f16> = (0..256).map(|i| f16::from_f32(i as f32 * 0.25)).collect();
        for width in [LoadWidth::X1, LoadWidth::X2, LoadWidth::X4] {
            let n = width.tiles() * 64;
            assert_eq!(
                cuda.load_matrix(width, &tiles[..n]).unwrap(),
                cpu.load_matrix(width, &tiles[..n]).unwrap(),
                "{}",
                width.as_str()
            );
        }
    }

    #[test]
    fn test_cuda_mma_matches_cpu() {
        let Some(cuda) = cuda_or_skip() else { return };
        let cpu = CpuBackend::new();

        let mut rng = StdRng::seed_from_u64(41);
        let mut quarter = || f16::from_f32(rng.gen_range(-8i32..8) as f32 / 4.0);
        let a = Matrix16x8::from_fn(|_, _| quarter());
        let b = Matrix8x8::from_fn(|_, _| quarter());
        let c = Matrix16x8::from_fn(|_, _| quarter());

        let (fa, fb, fc) = (
            FragmentA::from_matrix(&a),
            FragmentB::from_matrix(&b),
            FragmentC::from_matrix(&c),
        );
        let gpu = cuda.mma_16x8x8(&fa, &fb, &fc).unwrap();
        let host = cpu.mma_16x8x8(&fa, &fb, &fc).unwrap();
        assert_eq!(gpu.to_matrix(), host.to_matrix());
    }
}
