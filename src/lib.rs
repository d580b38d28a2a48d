pub mod configuration;

pub mod math {
    pub mod curve {
        pub mod curve;
        pub mod controlpoint;
        pub mod monotonespline;
        pub mod nonparametriccurve {
            pub mod nonparametriccurve;
            pub mod piecewisepolynomial;
        }
        pub mod resampler {
            pub mod cachebackend;
            pub mod curveresampler;
        }
    }
}

pub mod model {
    pub mod anchorspec;
    pub mod effortcdf;
    pub mod successcurve;
    pub mod mitigation;
    pub mod fatalities;
}

pub mod modelerror;

pub mod pipeline;

pub mod revision;
